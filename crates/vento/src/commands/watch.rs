//! `vento watch`: poll on an interval and stream every update.

use chrono::Utc;
use tokio::sync::mpsc;

use vento_core::{PollEvent, Poller};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let mut poller_config = config::resolve_poller_config(global, &cfg, &args.selection)?;
    if let Some(interval) = args.interval {
        poller_config.interval = interval;
    }
    let format = config::output_format(global, &cfg);
    let color = output::should_color(global.color);

    let poller = Poller::new(poller_config);

    // Listeners run on the polling task; hand events to this one.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _listener = poller.subscribe(move |event: &PollEvent| {
        let _ = tx.send(event.clone());
    });

    poller.start().await?;
    tracing::info!(
        interval = ?poller.config().interval,
        "watching, press Ctrl-C to stop"
    );

    let mut updates = 0u64;
    let result = loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break Ok(());
            }
            event = rx.recv() => match event {
                Some(PollEvent::Updated(snapshot)) => {
                    match output::render_update(format, &snapshot) {
                        Ok(line) => output::print_output(&line, global.quiet),
                        Err(e) => break Err(e),
                    }
                    updates += 1;
                    if args.count.is_some_and(|n| updates >= n) {
                        break Ok(());
                    }
                }
                Some(PollEvent::Failed(err)) => {
                    eprintln!("{}", output::render_failure(&err.to_string(), Utc::now(), color));
                }
                None => break Ok(()),
            },
        }
    };

    poller.stop().await;
    result
}
