use argh::FromArgs;
use hickory_resolver::Resolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;

use iota::{Iota, config, database};

/// A chat bot assembled from small plugins.
#[derive(Debug, FromArgs)]
struct Opts {
    /// path to the configuration file
    #[argh(option, short = 'c', default = "String::from(\"config.toml\")")]
    config: String,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let opts: Opts = argh::from_env();

    let config = config::load(&opts.config)?;

    iota::tracing::try_init(&config.tracing)?;

    let db = database::connect(&config.database).await?;
    database::migrate(&db).await?;

    let dns = Resolver::builder_with_config(
        ResolverConfig::cloudflare(),
        TokioConnectionProvider::default(),
    )
    .build();

    let mut bot = Iota::new(config, db, dns);

    bot.run().await?;

    Ok(())
}
