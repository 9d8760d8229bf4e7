use clap::{Arg, Command};
use portfolio_listings::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("portfolio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render the public investment listings of a Supabase project")
        .arg(
            Arg::new("search")
                .short('s')
                .long("search")
                .value_name("TEXT")
                .takes_value(true)
                .help("Only show deals whose city, name or info contains TEXT"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .value_name("STATE")
                .takes_value(true)
                .help("Only show deals in STATE"),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Keep running and re-render whenever the deals change"),
        )
        .get_matches();

    let settings = Settings::from_env()?;
    let supabase = Supabase::from_settings(&settings, ClientOptions::default());

    let mut view = ListingsView::new(
        PostgrestDealSource::new(&supabase),
        RealtimeChangeFeed::new(&supabase),
    );
    if let Some(search) = matches.value_of("search") {
        view.set_search(search);
    }
    if let Some(state) = matches.value_of("state") {
        view.select_state(state);
    }

    let mut revisions = view.watch();
    view.mount().await;
    revisions.borrow_and_update();
    println!("{}", render_page(&view.snapshot().await));

    if matches.is_present("watch") {
        info!("watching for changes, press Ctrl-C to stop");
        loop {
            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("{}", render_page(&view.snapshot().await));
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    view.unmount();
    Ok(())
}
