use petstore_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    petstore_observability::init();

    let config = Config::load()?;
    petstore_api::server::run(config).await
}
