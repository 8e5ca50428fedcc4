use std::{panic, path::PathBuf};

use clap::Parser;

use taskmaster::{
    cli::{self, CliEnvironment, RootCommand},
    logging::{LogOptions, init_logging, print_log_location},
};

#[derive(Parser, Debug)]
#[command(
    name = "taskmaster",
    about = "Task list with categories, local storage and Google Drive sync",
    long_about = "Manage a categorized task list from the terminal, render it as a page, and serve the web client.",
    version = env!("TASKMASTER_BUILD_VERSION"),
    author
)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: RootCommand,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let options = LogOptions {
        console: matches!(cli.command, RootCommand::Serve(_)),
    };
    let log_path = match init_logging(options) {
        Ok(path) => Some(path),
        Err(err) => {
            eprintln!("warning: failed to initialize logging: {err}");
            None
        }
    };
    if let Some(path) = log_path {
        install_panic_hook_with_log(path);
    }

    let env = CliEnvironment::from_system();
    let code = cli::run(&env, cli.command, cli.json, cli.quiet).await;
    std::process::exit(code);
}

fn install_panic_hook_with_log(log_path: PathBuf) {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("panic: {panic_info}");
        default_hook(panic_info);
        print_log_location(&log_path);
    }));
}
