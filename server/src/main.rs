//! Boot sequencing: reads `NOW` from a text file, loads the seed ZIP,
//! binds `PORT`, and installs the `tracing` subscriber.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;

use accounts_engine::{loader, Store};
use accounts_server::state::AppState;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let zip_path = args.next().unwrap_or_else(|| "data.zip".to_string());
    let now_path = args.next().unwrap_or_else(|| "options.txt".to_string());

    let now_contents = std::fs::read_to_string(&now_path)
        .unwrap_or_else(|e| panic!("failed to read NOW file {now_path}: {e}"));
    let now = loader::read_now(&now_contents).expect("options file's first line must be an integer");
    tracing::info!(now, "loaded fixed NOW constant");

    let mut store = Store::new(now);
    match File::open(&zip_path) {
        Ok(file) => {
            let summary =
                loader::load(&mut store, BufReader::new(file)).expect("seed archive failed to load");
            tracing::info!(accounts = summary.accounts, "seed load complete");
        }
        Err(e) => {
            tracing::warn!(zip_path, error = %e, "no seed archive found, starting empty");
        }
    }

    let state = AppState::new(store);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));
        tracing::info!(%addr, "listening");
        accounts_server::serve(listener, state).await;
    });
}
