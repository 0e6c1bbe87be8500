use crate::features::world::{DmvcWorld, TOKENS};
use cucumber::given;

#[given(expr = "I am authenticated as {string}")]
async fn given_authenticated(world: &mut DmvcWorld, role: String) {
    let (token, _, _) = TOKENS
        .iter()
        .find(|(_, _, r)| *r == role)
        .unwrap_or_else(|| panic!("no test token for role {}", role));
    world.token = Some(token.to_string());
}

#[given(expr = "I use the bearer token {string}")]
async fn given_token(world: &mut DmvcWorld, token: String) {
    world.token = Some(token);
}

#[given(expr = "I am not authenticated")]
async fn given_anonymous(world: &mut DmvcWorld) {
    world.token = None;
}
