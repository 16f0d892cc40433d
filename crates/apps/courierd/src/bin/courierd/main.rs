//! courierd — device-side daemon of the courier SMS/MMS bridge.
//!
//! Speaks newline-delimited JSON with the host bridge process on stdio
//! and serves commands from the local telephony store. Everything runs on
//! a single-threaded runtime; the dispatch loop drains one event queue.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::LocalSet;

use courier_daemon::config::{default_cache_dir, default_db_path, Config};
use courier_daemon::platform::{
    ConfigPermissions, NotificationSink, StubNotifications, StubScheduler,
};
use courier_daemon::processor::{ProcessorOptions, StoreAdapters};
use courier_daemon::sender::StubTransaction;
use courier_daemon::transport::{pump_reader, pump_writer};
use courier_daemon::{BridgeHandle, CommandProcessor, Correlator, Event};
use courier_telephony::{ContactAdapter, MmsAdapter, SmsAdapter, TelephonyDb, ThreadAdapter};

#[derive(Debug, Parser)]
#[command(name = "courierd", version, about = "SMS/MMS bridge daemon")]
struct Args {
    /// Path to the TOML config file (default location is used when absent).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Telephony store database path.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory for materialized MMS attachment bodies.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Channel id for the foreground indicator.
    #[arg(long, default_value = "courier")]
    channel_id: String,

    /// Icon handle for the foreground indicator.
    #[arg(long)]
    channel_icon: Option<i64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal: {err}");
            eprintln!("courierd: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args.config.as_deref())?;

    let db_path = args.db.unwrap_or_else(default_db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let cache_dir = args.cache_dir.unwrap_or_else(default_cache_dir);
    std::fs::create_dir_all(&cache_dir)?;

    let db = Rc::new(TelephonyDb::open(&db_path)?);
    let store = StoreAdapters {
        sms: SmsAdapter::new(db.clone(), config.creator_tag.clone()),
        mms: MmsAdapter::new(db.clone(), cache_dir, config.creator_tag.clone()),
        threads: ThreadAdapter::new(db.clone()),
        contacts: ContactAdapter::new(db),
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let bridge = BridgeHandle::new(outbound_tx, Rc::new(Correlator::new()));

    let processor = CommandProcessor::new(
        bridge,
        store,
        Rc::new(StubTransaction::new(event_tx.clone())),
        Rc::new(ConfigPermissions::new(config.permissions_granted)),
        Rc::new(StubScheduler),
        ProcessorOptions {
            push_key: config.push_key.clone(),
            use_old_mms_guids_until: config.use_old_mms_guids_until,
            supports_contacts: config.supports_contacts,
            supports_groups: config.supports_groups,
        },
    );

    let notifications = StubNotifications;
    notifications.foreground_started(&args.channel_id, args.channel_icon);

    let local = LocalSet::new();
    local
        .run_until(async move {
            let _reader = tokio::task::spawn_local(pump_reader(
                BufReader::new(tokio::io::stdin()),
                event_tx,
            ));
            let writer = tokio::task::spawn_local(pump_writer(tokio::io::stdout(), outbound_rx));

            info!("courierd ready, db at {}", db_path.display());
            while let Some(event) = event_rx.recv().await {
                let done = matches!(event, Event::Eof);
                processor.handle_event(event);
                if done {
                    break;
                }
            }

            // Release the outbound sender so the writer can drain and stop.
            // Reply tasks for sends still in flight hold clones; the writer
            // wait is bounded so an unfinished send cannot wedge shutdown.
            drop(processor);
            drop(event_rx);
            if tokio::time::timeout(Duration::from_secs(1), writer)
                .await
                .is_err()
            {
                warn!("outbound writer did not drain before shutdown");
            }
        })
        .await;

    notifications.foreground_stopped();
    info!("courierd stopped");
    Ok(())
}
