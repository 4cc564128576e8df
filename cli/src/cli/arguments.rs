use anyhow::Result;
use clap::{Parser, Subcommand};
use hyper::{Body, Request};
use log::info;
use std::sync::Arc;
use viaduct::pipeline::BaseExecutor;
use viaduct::pool::report;
use viaduct::{Pipeline, PipelineRequest, PoolService, RankedPool, Registry, Settings, Transport};

#[derive(Parser, Debug, Clone)]
#[command(name = "viaduct", about, author, version, long_about = None, propagate_version = true)]
pub struct ViaductArguments {
    #[arg(short = 'c', long = "config", default_value = "./viaduct.json", help = "Path to the configuration file")]
    pub(crate) config_path: String,
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: ViaductCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ViaductCommands {
    #[clap(name = "fetch", about = "Send a GET request through the configured pipeline")]
    Fetch {
        url: String,
        #[arg(short = 'x', long = "proxy", help = "Route this request through a specific endpoint, bypassing the pool and the global proxy")]
        proxy: Option<String>,
    },
    #[clap(name = "pool", about = "Manage the ranked endpoint pool")]
    Pool {
        #[clap(subcommand)]
        command: PoolCommands,
    },
    #[clap(name = "config", about = "Manage the configuration file")]
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PoolCommands {
    #[clap(name = "build", about = "Retrieve, probe and rank the candidate endpoints")]
    Build,
    #[clap(name = "list", about = "List the endpoints from the last written report")]
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    #[clap(name = "show", about = "Show the current configuration")]
    Show,
    #[clap(name = "show-path", about = "Show the path to the configuration file")]
    ShowPath,
}

impl ViaductArguments {
    pub async fn handle_arguments(&self) -> Result<()> {
        let settings = Settings::try_load(&self.config_path).await?;
        match &self.command {
            ViaductCommands::Fetch { url, proxy } => fetch(&settings, url, proxy.clone()).await,

            ViaductCommands::Pool { command } => match command {
                PoolCommands::Build => {
                    let transport = Transport::from_settings(&settings)?;
                    let service = PoolService::from_settings(&settings, &transport)?;
                    let usable = service.rebuild().await?;
                    info!("Pool report written with {} usable endpoints", usable);
                    Ok(())
                }
                PoolCommands::List => {
                    let entries = report::read(&settings.pool.report_path).await?;
                    for entry in &entries {
                        println!(
                            "\x1b[1;36m{}\x1b[0m: \x1b[1;32m{:.3}s\x1b[0m \x1b[1;33m{}\x1b[0m",
                            entry.proxy, entry.response_time, entry.body_response
                        );
                    }
                    Ok(())
                }
            },

            ViaductCommands::Config { command } => match command {
                ConfigCommands::Show => {
                    println!("{}", settings);
                    Ok(())
                }
                ConfigCommands::ShowPath => {
                    println!("{}", settings.get_path().to_string_lossy());
                    Ok(())
                }
            },
        }
    }
}

/// Full startup order for one request: transport, proxy verification, pool
/// build when the pool decorator is configured, registry, pipeline, execute.
async fn fetch(settings: &Settings, url: &str, proxy: Option<String>) -> Result<()> {
    let transport = Transport::from_settings(settings)?;
    if transport.is_proxy() {
        transport.verify_connection(&settings.proxy.verify_url).await?;
        info!("Global proxy connection verified");
    }

    let plugin_names = settings.plugin_names();
    let pool = if plugin_names.iter().any(|name| name == "proxy-pool") {
        let service = Arc::new(PoolService::from_settings(settings, &transport)?);
        service.rebuild().await?;
        let pool = service.pool();
        service.spawn_refresh();
        pool
    } else {
        Arc::new(RankedPool::new(settings.pool.max_size))
    };

    let registry = Registry::load(settings, pool)?;
    let pipeline = Pipeline::build(Arc::new(BaseExecutor::new(transport)), &registry);

    let request = Request::get(url).body(Body::empty())?;
    let mut pipeline_request = PipelineRequest::new(request);
    if let Some(addr) = proxy {
        pipeline_request = pipeline_request.with_proxy(addr);
    }

    let response = pipeline.execute(pipeline_request).await?;
    let status = response.status();
    info!("Response status: {}", status);
    let body = hyper::body::to_bytes(response.into_body()).await?;
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}
