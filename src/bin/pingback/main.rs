use anyhow::Context;
use pingback::{GitHub, build_cursor, build_messenger, get_github_token, parse_args, run_once};

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,pingback=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    let token = get_github_token(config.github_token.as_deref())
        .context("Failed to obtain GitHub authentication token")?;
    let forge = GitHub::new(token, &config.org)?;
    let messenger = build_messenger(&config)?;
    let cursor = build_cursor(&config);

    run_once(&forge, &*messenger, &*cursor, &config.target).await?;

    Ok(())
}
