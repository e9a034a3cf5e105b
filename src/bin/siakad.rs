use siakad::{self, cli, config, SiakadError};

fn main() {
    // Install global collector configured based on SIAKAD_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env(
            config::env::LOG_DIRECTIVE,
        ))
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .on_thread_start(|| tracing::trace!("thread start"))
        .on_thread_stop(|| tracing::trace!("thread stop"))
        .enable_io()
        .enable_time()
        .build()
        .unwrap()
        .block_on(async {
            run().await;
        })
}

async fn run() {
    if let Err(err) = cli::parse().run().await {
        let code = match err {
            SiakadError::Unauthenticated => {
                eprintln!("unauthenticated");
                2
            }
            SiakadError::Forbidden { .. } => {
                eprintln!("{}", err);
                3
            }
            _ => {
                eprintln!("{}", err);
                if let Some(backtrace) = err.backtrace() {
                    tracing::debug!("{:?}", backtrace);
                }
                1
            }
        };
        std::process::exit(code);
    };
}
