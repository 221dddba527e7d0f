use trip_planner::config::Config;
use trip_planner::engine::Engine;
use trip_planner::error::Error;
use trip_planner::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let engine = Engine::from_config(&config);

    serve(engine, config.addr).await
}
