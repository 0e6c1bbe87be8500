use cucumber::{cli, World};
use cucumber_tests::features::DmvcWorld;

#[tokio::main]
async fn main() {
    DmvcWorld::cucumber().with_cli::<()>(cli::Opts::parsed()).run_and_exit("features/").await;
}
