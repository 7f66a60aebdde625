//! inputcore - standalone input daemon
//!
//! Runs the input platform on the console: libinput devices in, logged
//! client deliveries out. Useful to check device detection, layouts and
//! shortcuts without a compositor.

use anyhow::{anyhow, Result};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};

use inputcore::bus::{DbusBus, LocalBus, NotificationBus};
use inputcore::config::Config;
use inputcore::event::{monotonic_msec, Event};
use inputcore::seat::{RepeatInfo, Seat, SeatCapabilities};
use inputcore::shell::NullShell;
use inputcore::xkb::XkbFactory;
use inputcore::{Platform, PlatformParts};

#[cfg(target_os = "linux")]
use inputcore::backend::{Backend, LibinputBackend};

/// Poll timeout, also the key repeat and shortcut timer resolution
const POLL_TIMEOUT_MS: i32 = 10;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn shutdown_signal_handler(_signo: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

/// SIGTERM (systemd stop) and SIGINT (Ctrl+C) request a clean exit
fn setup_signal_handlers() {
    unsafe {
        libc::signal(
            libc::SIGTERM,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGINT,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
    }
}

/// Seat without clients: logs what would be delivered
struct LogSeat;

impl Seat for LogSeat {
    fn forward(&mut self, event: &Event) {
        trace!("deliver {:?}", event);
    }

    fn unhandled(&mut self, event: &Event) {
        trace!("unhandled {}", event.name());
    }

    fn set_capabilities(&mut self, caps: SeatCapabilities) {
        info!("Seat capabilities: {:?}", caps);
    }

    fn set_repeat_info(&mut self, info: RepeatInfo) {
        debug!("Repeat rate {} delay {}ms", info.rate, info.delay_ms);
    }

    fn set_keymap(&mut self, keymap: &str) {
        debug!("Keymap updated ({} bytes)", keymap.len());
    }
}

fn print_help() {
    println!(
        r#"inputcore {} - input handling core for display servers

USAGE:
    inputcore [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -t, --test              Test mode (verify build without devices)
    -l, --list-devices      Print detected input devices and exit
    --no-dbus               Do not connect to the session bus

CONFIG FILE:
    ~/.config/inputcore/config.toml

    Reloaded automatically when changed.

ENVIRONMENT:
    RUST_LOG                Log filter (default: warn)"#,
        env!("CARGO_PKG_VERSION")
    );
}

fn notification_bus(use_dbus: bool) -> Box<dyn NotificationBus> {
    if use_dbus {
        match DbusBus::try_new() {
            Ok(bus) => return Box::new(bus),
            Err(e) => warn!("D-Bus unavailable, notifications stay local: {:#}", e),
        }
    }
    Box::new(LocalBus::new())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("inputcore {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--test" || a == "-t") {
        info!("Test mode: skipping device initialization");
        eprintln!("[OK] inputcore build verification complete");
        return Ok(());
    }

    let list_devices = args.iter().any(|a| a == "--list-devices" || a == "-l");
    let use_dbus = !list_devices && !args.iter().any(|a| a == "--no-dbus");

    info!("inputcore starting...");
    run(list_devices, use_dbus)
}

#[cfg(not(target_os = "linux"))]
fn run(_list_devices: bool, _use_dbus: bool) -> Result<()> {
    Err(anyhow!("inputcore needs libinput, which is Linux only"))
}

#[cfg(target_os = "linux")]
fn run(list_devices: bool, use_dbus: bool) -> Result<()> {
    setup_signal_handlers();

    #[cfg(feature = "seatd")]
    let session = match inputcore::session::SeatSession::open() {
        Ok(s) => Some(std::rc::Rc::new(std::cell::RefCell::new(s))),
        Err(e) => {
            warn!("libseat unavailable, opening devices directly: {:#}", e);
            None
        }
    };

    #[cfg(feature = "seatd")]
    let vt: Option<Box<dyn inputcore::session::VtSwitcher>> = session
        .clone()
        .map(|s| Box::new(s) as Box<dyn inputcore::session::VtSwitcher>);
    #[cfg(not(feature = "seatd"))]
    let vt: Option<Box<dyn inputcore::session::VtSwitcher>> = None;

    let parts = PlatformParts {
        keymaps: Box::new(XkbFactory::new()),
        seat: Box::new(LogSeat),
        shell: Box::new(NullShell),
        bus: notification_bus(use_dbus),
        vt,
    };
    let mut platform = Platform::new(parts, Config::open_store());
    platform.set_action_handler(|action| info!("Action: {}", action));

    #[cfg(feature = "seatd")]
    let mut backend = match session.clone() {
        Some(s) => LibinputBackend::open_with_seat(s)?,
        None => LibinputBackend::open()?,
    };
    #[cfg(not(feature = "seatd"))]
    let mut backend = LibinputBackend::open()?;

    backend.dispatch(&mut platform)?;

    if list_devices {
        for (id, device) in platform.devices() {
            println!(
                "{:>4}  {:<8} {:<10} {} ({:?})",
                id.to_string(),
                device.kind().name(),
                device.native(),
                device.name(),
                device.capabilities()
            );
        }
        return Ok(());
    }

    let config_watcher = Config::config_path().and_then(|path| {
        inputcore::config::ConfigWatcher::new(&path)
            .map_err(|e| warn!("Config hot-reload disabled: {:#}", e))
            .ok()
    });

    let mut fds = Vec::new();
    if let Some(fd) = backend.fd() {
        fds.push(fd);
    }
    if let Some(fd) = backend.hotplug_fd() {
        fds.push(fd);
    }
    #[cfg(feature = "seatd")]
    if let Some(s) = session.as_ref() {
        fds.push(s.borrow_mut().get_fd()?);
    }

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);
    info!("Input loop started");

    loop {
        let mut pollfds: Vec<libc::pollfd> = fds
            .iter()
            .map(|fd| libc::pollfd {
                fd: *fd,
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();
        let ret = unsafe {
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                POLL_TIMEOUT_MS,
            )
        };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(anyhow!("poll failed: {}", err));
            }
        }

        #[cfg(feature = "seatd")]
        if let Some(s) = session.as_ref() {
            let mut s = s.borrow_mut();
            if let Err(e) = s.dispatch() {
                warn!("{:#}", e);
            }
            while let Some(event) = s.try_recv_event() {
                debug!("Session event: {:?}", event);
            }
        }

        if ret > 0 {
            backend.dispatch(&mut platform)?;
        }

        // same clock libinput stamps events with
        platform.tick(monotonic_msec());
        platform.poll_bus();

        if let Some(ref watcher) = config_watcher {
            if watcher.check_reload() {
                info!("Config file change detected, reloading...");
                platform.reload_config();
            }
        }

        if SHUTDOWN_REQUESTED.load(Ordering::Relaxed) {
            info!("Received shutdown signal, exiting...");
            break;
        }
        if platform.terminate_requested() {
            info!("Terminate key pressed, exiting...");
            break;
        }
    }

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Stopping]);
    Ok(())
}
