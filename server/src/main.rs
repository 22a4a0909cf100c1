use crate::api::{PushRequest, PushResponse};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, web};
use common::{PlatformRegistry, PushResult};
use dingtalk_robot::DingTalkPlatformFactory;
use log::*;

mod api;

const BIND_ADDR: (&str, u16) = ("127.0.0.1", 8888);

#[get("/hello")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Hello World!")
}

#[post("/push")]
async fn push(req: web::Json<PushRequest>, registry: web::Data<PlatformRegistry>) -> HttpResponse {
    info!("Received push request for platform: {}", req.platform);

    let Some(factory) = registry.get_factory(&req.platform) else {
        return HttpResponse::BadRequest().json(PushResponse {
            result: PushResult::failure(format!("Platform '{}' not found", req.platform)),
        });
    };

    let platform = match factory.create(req.config.clone()) {
        Ok(p) => p,
        Err(e) => {
            return HttpResponse::BadRequest().json(PushResponse {
                result: PushResult::failure(format!("Failed to create platform: {}", e)),
            });
        }
    };

    let outcome = platform.push(req.into_inner().message).await;
    if let Err(e) = &outcome {
        warn!("Push failed: {}", e);
    }

    HttpResponse::Ok().json(PushResponse {
        result: PushResult::from(outcome),
    })
}

fn build_registry() -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();
    registry.register(Box::new(DingTalkPlatformFactory));
    registry
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));

    let registry = build_registry();
    info!("Registered platforms: {:?}", registry.list_platforms());

    let registry_data = web::Data::new(registry);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(registry_data.clone())
            .service(hello)
            .service(push)
    })
    .bind(BIND_ADDR)?
    .run()
    .await?;

    Ok(())
}
