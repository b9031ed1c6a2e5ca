use hashdrop_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under many concurrent
// streaming uploads, especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Database, content store, services, routes
    let (_state, router) = hashdrop_api::setup::initialize_app(config.clone()).await?;

    hashdrop_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
