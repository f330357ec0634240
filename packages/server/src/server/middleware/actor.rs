use axum::{extract::Request, middleware::Next, response::Response};

use crate::common::ActorId;

/// Header the auth gateway uses to forward the caller's identity.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Extension holding the authenticated caller, if any.
#[derive(Clone, Debug)]
pub struct Actor(pub ActorId);

/// Middleware to lift the forwarded actor identity into request extensions.
///
/// Missing, non-UTF-8 or blank headers leave the request anonymous.
pub async fn extract_actor(mut request: Request, next: Next) -> Response {
    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(ActorId::new);

    if let Some(actor) = actor {
        request.extensions_mut().insert(Actor(actor));
    }

    next.run(request).await
}
