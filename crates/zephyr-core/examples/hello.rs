//! Small zephyr server
//!
//! `cargo run -p zephyr-core --example hello`, then try
//! `/`, `/v1/hello/geek`, `/v2/panic` and `/missing`.

use zephyr_core::{logger, Context, Engine, ServerConfig, StatusCode};

fn main() -> zephyr_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zephyr_core=debug,hello=debug".into()),
        )
        .init();

    let mut engine = Engine::with_recovery();
    engine.use_middleware(logger());

    engine.get("/", |ctx: &mut Context| ctx.html(StatusCode::OK, "<h1>Hello zephyr</h1>"));
    engine.static_files("/assets", "./static");

    {
        let mut v1 = engine.group("/v1");
        v1.get("/hello/:name", |ctx: &mut Context| {
            let body = format!(
                "hello {}, you're at {}",
                ctx.param("name").unwrap_or_default(),
                ctx.path
            );
            ctx.string(StatusCode::OK, body);
        });
        v1.post("/login", |ctx: &mut Context| {
            let username = ctx.post_form("username").unwrap_or_default();
            if let Err(err) = ctx.json(StatusCode::OK, &serde_json::json!({ "username": username })) {
                ctx.fail(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
            }
        });
    }

    {
        let mut v2 = engine.group("/v2");
        v2.use_middleware(|ctx: &mut Context| {
            if ctx.query("token").is_none() {
                ctx.fail(StatusCode::UNAUTHORIZED, "missing token");
                return;
            }
            ctx.next();
        });
        v2.get("/panic", |ctx: &mut Context| {
            let names = ["geek"];
            let index = ctx.query("index").and_then(|i| i.parse().ok()).unwrap_or(100);
            ctx.string(StatusCode::OK, names[index]);
        });
    }

    engine.run(ServerConfig::new().port(9999))
}
