//! Command handler owning the active capture session

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use vcap::atlas::{encode_png, RenderHandle};
use vcap::events::BlockEventBus;
use vcap::model::ModelProvider;
use vcap::world::{ChunkBox, ChunkPos, WorldAccess};
use vcap::{CaptureSession, VcapExporter, VcapSettings};

use crate::protocol::{ConsoleResponse, ExportCommand};

/// Host services the console captures from
#[derive(Clone)]
pub struct ExportHost {
    pub world: Arc<dyn WorldAccess>,
    pub models: Arc<dyn ModelProvider>,
    pub bus: BlockEventBus,
    pub render: RenderHandle,
    /// Directory receiving `.vcap` and `.png` output
    pub export_dir: PathBuf,
    pub settings: VcapSettings,
}

/// Executes export commands. At most one live capture exists at a time.
///
/// Commands answer immediately; saves and atlas dumps finish in the
/// background and report on the feedback channel.
pub struct ExportConsole {
    host: ExportHost,
    runtime: Handle,
    session: Option<CaptureSession>,
    feedback: mpsc::UnboundedSender<ConsoleResponse>,
}

impl ExportConsole {
    pub fn new(host: ExportHost, runtime: Handle) -> (Self, mpsc::UnboundedReceiver<ConsoleResponse>) {
        let (feedback, receiver) = mpsc::unbounded_channel();
        let console = Self {
            host,
            runtime,
            session: None,
            feedback,
        };
        (console, receiver)
    }

    /// The live capture, if any
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Parse and execute a line of chat text
    pub fn execute_line(&mut self, line: &str, origin: ChunkPos) -> ConsoleResponse {
        match line.parse::<ExportCommand>() {
            Ok(cmd) => self.execute(cmd, origin),
            Err(e) => e.into(),
        }
    }

    /// Execute a command issued at chunk `origin`
    pub fn execute(&mut self, cmd: ExportCommand, origin: ChunkPos) -> ConsoleResponse {
        if let Err(e) = cmd.validate() {
            return e.into();
        }
        match cmd {
            ExportCommand::Start { name, radius } => self.start(name, radius, origin),
            ExportCommand::Frame => match &self.session {
                Some(session) => {
                    let pending: Vec<String> = session.pending().iter().map(ToString::to_string).collect();
                    ConsoleResponse::feedback(format!("[{}]", pending.join(", ")))
                }
                None => no_recording(),
            },
            ExportCommand::Atlas { name } => self.atlas(&name),
            ExportCommand::Full { name, radius } => self.full(&name, radius, origin),
            ExportCommand::Save => self.save(),
        }
    }

    fn start(&mut self, name: String, radius: u32, origin: ChunkPos) -> ConsoleResponse {
        if self.session.is_some() {
            return ConsoleResponse::error("A Vcap capture is already in process. Use 'export save' to stop it.");
        }
        let session = self
            .exporter(radius, origin)
            .and_then(|exporter| CaptureSession::start(name, exporter, &self.host.bus, self.host.render.clone()));
        match session {
            Ok(session) => {
                self.session = Some(session);
                ConsoleResponse::feedback("Started Vcap capture...")
            }
            Err(e) => ConsoleResponse::error(format!("Unable to start Vcap capture. {e}")),
        }
    }

    fn atlas(&self, name: &str) -> ConsoleResponse {
        let target = match self.target(name, "png") {
            Ok(target) => target,
            Err(e) => return ConsoleResponse::error(format!("Unable to save image. {e}")),
        };
        let render = self.host.render.clone();
        let feedback = self.feedback.clone();

        info!("Obtaining atlas texture...");
        self.runtime.spawn(async move {
            let image = match render.extract_atlas().await {
                Ok(image) => image,
                Err(e) => {
                    error!("Unable to retrieve atlas: {e}");
                    let _ = feedback.send(ConsoleResponse::error(format!("Unable to retrieve atlas. {e}")));
                    return;
                }
            };
            let mut png = Vec::new();
            let written = match encode_png(&image, &mut png) {
                Ok(()) => tokio::fs::write(&target, png).await.map_err(vcap::core::Error::from),
                Err(e) => Err(e),
            };
            let response = match written {
                Ok(()) => ConsoleResponse::feedback(format!("Wrote to {}", target.display())),
                Err(e) => {
                    error!("Unable to save image: {e}");
                    ConsoleResponse::error(format!("Unable to save image. {e}"))
                }
            };
            let _ = feedback.send(response);
        });
        ConsoleResponse::feedback("Obtaining atlas texture...")
    }

    fn full(&self, name: &str, radius: u32, origin: ChunkPos) -> ConsoleResponse {
        let mut exporter = match self.exporter(radius, origin) {
            Ok(exporter) => exporter,
            Err(e) => return ConsoleResponse::error(format!("Failed to save vcap. {e}")),
        };
        if let Err(e) = exporter.capture_iframe(0.0) {
            return ConsoleResponse::error(format!("Failed to save vcap. {e}"));
        }
        self.save_exporter(exporter, name)
    }

    fn save(&mut self) -> ConsoleResponse {
        let Some(session) = self.session.take() else {
            return no_recording();
        };
        let name = session.name().to_string();
        match session.finish() {
            Ok(exporter) => self.save_exporter(exporter, &name),
            Err(e) => ConsoleResponse::error(format!("Failed to save vcap. {e}")),
        }
    }

    /// Save in the background to `export/<name>.vcap`
    fn save_exporter(&self, exporter: VcapExporter, name: &str) -> ConsoleResponse {
        let file = self
            .target(name, "vcap")
            .and_then(|target| Ok((File::create(&target)?, target)));
        let (file, target) = match file {
            Ok(opened) => opened,
            Err(e) => return ConsoleResponse::error(format!("Unable to load file: {e}")),
        };

        let save = {
            let _guard = self.runtime.enter();
            exporter.save_async(BufWriter::new(file), self.host.render.clone())
        };
        let feedback = self.feedback.clone();
        self.runtime.spawn(async move {
            let flushed = save.wait().await.and_then(|mut out| Ok(out.flush()?));
            let response = match flushed {
                Ok(()) => ConsoleResponse::feedback(format!("Wrote to {}", target.display())),
                Err(e) => {
                    error!("Failed to save vcap: {e}");
                    ConsoleResponse::error(format!("Failed to save vcap. {e}"))
                }
            };
            let _ = feedback.send(response);
        });
        ConsoleResponse::feedback("Please wait...")
    }

    fn exporter(&self, radius: u32, origin: ChunkPos) -> vcap::core::Result<VcapExporter> {
        let bounds = ChunkBox::around(origin, radius)?;
        VcapExporter::new(
            self.host.world.clone(),
            self.host.models.clone(),
            bounds.min(),
            bounds.max(),
            self.host.settings.clone(),
        )
    }

    fn target(&self, name: &str, extension: &str) -> vcap::core::Result<PathBuf> {
        ensure_dir(&self.host.export_dir)?;
        Ok(self.host.export_dir.join(format!("{name}.{extension}")))
    }
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn no_recording() -> ConsoleResponse {
    ConsoleResponse::error("No Vcap recording active! Start one with 'export start'")
}
