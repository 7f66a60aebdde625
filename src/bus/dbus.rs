//! D-Bus notification bus
//!
//! Exports the keyboard layout service and the tablet-mode properties on
//! the session bus. D-Bus communication runs in a separate thread (tokio
//! runtime), communicating with the dispatch thread via mpsc channels.

use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use log::{debug, info, warn};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::oneshot;
use zbus::object_server::SignalContext;

use super::{BusRequest, LayoutInfo, NotificationBus};

const LAYOUTS_SERVICE: &str = "org.kde.keyboard";
const LAYOUTS_PATH: &str = "/Layouts";
const TABLET_MODE_PATH: &str = "/org/kde/KWin";

/// Commands from the dispatch thread to the bus thread
enum BusCommand {
    LayoutService(bool),
    LayoutChanged(u32),
    LayoutList(Vec<LayoutInfo>),
    Osd(String),
    TabletMode { available: bool, active: bool },
}

/// `org.kde.KeyboardLayouts` object
///
/// Current index and layout list are cached here so reads never reach the
/// dispatch thread.
struct KeyboardLayouts {
    current: u32,
    layouts: Vec<LayoutInfo>,
    requests: mpsc::Sender<BusRequest>,
}

#[zbus::interface(name = "org.kde.KeyboardLayouts")]
impl KeyboardLayouts {
    #[zbus(name = "setLayout")]
    async fn set_layout(&self, index: u32) -> bool {
        let (tx, rx) = oneshot::channel();
        let request = BusRequest::SetLayout {
            index,
            reply: Some(tx),
        };
        if self.requests.send(request).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    #[zbus(name = "getLayout")]
    async fn get_layout(&self) -> u32 {
        self.current
    }

    /// (short name, display name, long name) per layout
    #[zbus(name = "getLayoutsList")]
    async fn get_layouts_list(&self) -> Vec<(String, String, String)> {
        self.layouts
            .iter()
            .map(|l| (l.short_name.clone(), String::new(), l.long_name.clone()))
            .collect()
    }

    #[zbus(signal, name = "layoutChanged")]
    async fn layout_changed(ctxt: &SignalContext<'_>, index: u32) -> zbus::Result<()>;

    #[zbus(signal, name = "layoutListChanged")]
    async fn layout_list_changed(ctxt: &SignalContext<'_>) -> zbus::Result<()>;
}

/// `org.kde.KWin.TabletModeManager` object
#[derive(Default)]
struct TabletModeManager {
    available: bool,
    active: bool,
}

#[zbus::interface(name = "org.kde.KWin.TabletModeManager")]
impl TabletModeManager {
    #[zbus(property, name = "tabletModeAvailable")]
    async fn tablet_mode_available(&self) -> bool {
        self.available
    }

    #[zbus(property, name = "tabletMode")]
    async fn tablet_mode(&self) -> bool {
        self.active
    }
}

/// Session bus implementation of `NotificationBus`
pub struct DbusBus {
    cmd_tx: tokio::sync::mpsc::UnboundedSender<BusCommand>,
    req_rx: mpsc::Receiver<BusRequest>,
    /// Bus thread (terminates once the command channel closes)
    _thread: std::thread::JoinHandle<()>,
}

impl DbusBus {
    /// Connect to the session bus
    ///
    /// Returns Err if no session bus is reachable. 3 second timeout.
    pub fn try_new() -> Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<BusRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel::<BusCommand>();

        let thread = std::thread::Builder::new()
            .name("inputcore-dbus".into())
            .spawn(move || bus_thread(req_tx, cmd_rx, ready_tx))
            .context("Failed to start D-Bus thread")?;

        match ready_rx.recv_timeout(Duration::from_secs(3)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow!("D-Bus connection timeout")),
        }

        Ok(Self {
            cmd_tx,
            req_rx,
            _thread: thread,
        })
    }

    fn send(&self, command: BusCommand) {
        if self.cmd_tx.send(command).is_err() {
            warn!("D-Bus thread is gone, dropping notification");
        }
    }
}

impl NotificationBus for DbusBus {
    fn set_layout_service(&mut self, enabled: bool) {
        self.send(BusCommand::LayoutService(enabled));
    }

    fn layout_changed(&mut self, index: u32) {
        self.send(BusCommand::LayoutChanged(index));
    }

    fn layout_list_changed(&mut self, layouts: Vec<LayoutInfo>) {
        self.send(BusCommand::LayoutList(layouts));
    }

    fn show_layout_osd(&mut self, long_name: &str) {
        self.send(BusCommand::Osd(long_name.to_string()));
    }

    fn tablet_mode_changed(&mut self, available: bool, active: bool) {
        self.send(BusCommand::TabletMode { available, active });
    }

    fn poll_requests(&mut self) -> Vec<BusRequest> {
        let mut requests = Vec::new();
        while let Ok(request) = self.req_rx.try_recv() {
            requests.push(request);
        }
        requests
    }
}

/// Bus thread main function
fn bus_thread(
    req_tx: mpsc::Sender<BusRequest>,
    cmd_rx: tokio::sync::mpsc::UnboundedReceiver<BusCommand>,
    ready_tx: mpsc::Sender<Result<()>>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready_tx.send(Err(anyhow!("Failed to create tokio runtime: {}", e)));
            return;
        }
    };

    rt.block_on(async move {
        match bus_async_main(req_tx, cmd_rx, ready_tx).await {
            Ok(()) => info!("D-Bus thread terminated normally"),
            Err(e) => warn!("D-Bus thread error: {:#}", e),
        }
    });
}

/// Bus thread state kept across commands
struct BusState {
    connection: zbus::Connection,
    requests: mpsc::Sender<BusRequest>,
    layouts_exported: bool,
    current: u32,
    layouts: Vec<LayoutInfo>,
}

impl BusState {
    async fn handle(&mut self, command: BusCommand) -> Result<()> {
        match command {
            BusCommand::LayoutService(true) if !self.layouts_exported => {
                let iface = KeyboardLayouts {
                    current: self.current,
                    layouts: self.layouts.clone(),
                    requests: self.requests.clone(),
                };
                self.connection.object_server().at(LAYOUTS_PATH, iface).await?;
                if let Err(e) = self.connection.request_name(LAYOUTS_SERVICE).await {
                    warn!("Failed to own {}: {}", LAYOUTS_SERVICE, e);
                }
                self.layouts_exported = true;
                info!("Keyboard layout service registered");
            }
            BusCommand::LayoutService(false) if self.layouts_exported => {
                self.connection
                    .object_server()
                    .remove::<KeyboardLayouts, _>(LAYOUTS_PATH)
                    .await?;
                let _ = self.connection.release_name(LAYOUTS_SERVICE).await;
                self.layouts_exported = false;
                info!("Keyboard layout service unregistered");
            }
            BusCommand::LayoutService(_) => {}
            BusCommand::LayoutChanged(index) => {
                self.current = index;
                if self.layouts_exported {
                    let iface = self
                        .connection
                        .object_server()
                        .interface::<_, KeyboardLayouts>(LAYOUTS_PATH)
                        .await?;
                    iface.get_mut().await.current = index;
                    KeyboardLayouts::layout_changed(iface.signal_context(), index).await?;
                }
            }
            BusCommand::LayoutList(layouts) => {
                self.layouts = layouts;
                if self.layouts_exported {
                    let iface = self
                        .connection
                        .object_server()
                        .interface::<_, KeyboardLayouts>(LAYOUTS_PATH)
                        .await?;
                    iface.get_mut().await.layouts = self.layouts.clone();
                    KeyboardLayouts::layout_list_changed(iface.signal_context()).await?;
                }
            }
            BusCommand::Osd(text) => {
                let result = self
                    .connection
                    .call_method(
                        Some("org.kde.plasmashell"),
                        "/org/kde/osdService",
                        Some("org.kde.osdService"),
                        "kbdLayoutChanged",
                        &(text.as_str(),),
                    )
                    .await;
                // no OSD provider is not an error worth more than debug
                if let Err(e) = result {
                    debug!("OSD notification failed: {}", e);
                }
            }
            BusCommand::TabletMode { available, active } => {
                let iface = self
                    .connection
                    .object_server()
                    .interface::<_, TabletModeManager>(TABLET_MODE_PATH)
                    .await?;
                let mut manager = iface.get_mut().await;
                let ctxt = iface.signal_context();
                if manager.available != available {
                    manager.available = available;
                    manager.tablet_mode_available_changed(ctxt).await?;
                }
                if manager.active != active {
                    manager.active = active;
                    manager.tablet_mode_changed(ctxt).await?;
                }
            }
        }
        Ok(())
    }
}

/// Bus thread async main
async fn bus_async_main(
    req_tx: mpsc::Sender<BusRequest>,
    mut cmd_rx: tokio::sync::mpsc::UnboundedReceiver<BusCommand>,
    ready_tx: mpsc::Sender<Result<()>>,
) -> Result<()> {
    let connection = match zbus::Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(anyhow!("Failed to connect to D-Bus session bus: {}", e)));
            return Ok(());
        }
    };

    if let Err(e) = connection
        .object_server()
        .at(TABLET_MODE_PATH, TabletModeManager::default())
        .await
    {
        let _ = ready_tx.send(Err(anyhow!("Failed to export tablet mode manager: {}", e)));
        return Ok(());
    }

    // reloadConfig is broadcast by config tools as a plain signal
    let rule = zbus::MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .interface("org.kde.keyboard")?
        .member("reloadConfig")?
        .path(LAYOUTS_PATH)?
        .build();
    let mut reload_stream = zbus::MessageStream::for_match_rule(rule, &connection, None)
        .await
        .context("Failed to subscribe to reloadConfig")?;

    let _ = ready_tx.send(Ok(()));
    info!("D-Bus thread started");

    let mut state = BusState {
        connection,
        requests: req_tx.clone(),
        layouts_exported: false,
        current: 0,
        layouts: Vec::new(),
    };

    loop {
        tokio::select! {
            Some(msg) = reload_stream.next() => {
                match msg {
                    Ok(_) => {
                        debug!("reloadConfig received");
                        if req_tx.send(BusRequest::ReloadConfig).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("reloadConfig stream error: {}", e),
                }
            }

            command = cmd_rx.recv() => {
                let Some(command) = command else {
                    info!("D-Bus command channel closed");
                    break;
                };
                if let Err(e) = state.handle(command).await {
                    warn!("D-Bus command failed: {:#}", e);
                }
            }
        }
    }

    Ok(())
}
