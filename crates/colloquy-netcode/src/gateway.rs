//! Replication gateway
//!
//! Decides per call whether a mutation is applied on the spot
//! (standalone) or broadcast as a replicated command whose local
//! application happens when its echo is drained by [`ReplicationGateway::poll`].

use crate::authority::ParticipantMode;
use crate::command::ReplicatedCommand;
use crate::transport::CommandTransport;
use crate::Result;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What happened to a routed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Applied locally, nothing was sent
    Applied,
    /// Broadcast; it will be applied when the echo arrives
    Replicated,
}

enum Link {
    Standalone,
    Distributed {
        mode: ParticipantMode,
        transport: Arc<dyn CommandTransport>,
    },
}

/// Routes mutations either straight to the local state or through replication
pub struct ReplicationGateway {
    link: Link,
    sent: AtomicU64,
    received: AtomicU64,
}

impl ReplicationGateway {
    /// Gateway for a single-participant session
    pub fn standalone() -> Self {
        Self::with_link(Link::Standalone)
    }

    /// Gateway for a lockstep session
    pub fn distributed(role: crate::AuthorityRole, transport: Arc<dyn CommandTransport>) -> Self {
        Self::with_link(Link::Distributed {
            mode: ParticipantMode::Distributed(role),
            transport,
        })
    }

    fn with_link(link: Link) -> Self {
        Self {
            link,
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
        }
    }

    /// How this participant takes part
    pub fn mode(&self) -> ParticipantMode {
        match &self.link {
            Link::Standalone => ParticipantMode::Standalone,
            Link::Distributed { mode, .. } => *mode,
        }
    }

    /// Route one command
    ///
    /// Standalone: `apply` runs now. Distributed: the command is framed and
    /// broadcast and `apply` is dropped unused.
    pub fn route(&self, command: ReplicatedCommand, apply: impl FnOnce(ReplicatedCommand)) -> Result<Dispatch> {
        match &self.link {
            Link::Standalone => {
                apply(command);
                Ok(Dispatch::Applied)
            }
            Link::Distributed { transport, .. } => {
                let frame = command.encode()?;
                transport.broadcast(&frame)?;
                self.sent.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(command = command.name(), bytes = frame.len(), "replicated");
                Ok(Dispatch::Replicated)
            }
        }
    }

    /// Route an ordered batch
    ///
    /// Every command is framed before anything is sent, so a codec failure
    /// sends nothing. A transport failure partway through leaves the frames
    /// already broadcast on the wire.
    pub fn route_batch(
        &self,
        commands: Vec<ReplicatedCommand>,
        mut apply: impl FnMut(ReplicatedCommand),
    ) -> Result<Dispatch> {
        match &self.link {
            Link::Standalone => {
                commands.into_iter().for_each(&mut apply);
                Ok(Dispatch::Applied)
            }
            Link::Distributed { transport, .. } => {
                let frames = commands
                    .iter()
                    .map(ReplicatedCommand::encode)
                    .collect::<Result<Vec<_>>>()?;
                for frame in &frames {
                    transport.broadcast(frame)?;
                }
                self.sent.fetch_add(frames.len() as u64, Ordering::Relaxed);
                tracing::debug!(count = frames.len(), "replicated batch");
                Ok(Dispatch::Replicated)
            }
        }
    }

    /// Drain every delivered command, in transport order
    ///
    /// Frames that fail to decode are logged and skipped.
    pub fn poll(&self) -> Result<Vec<ReplicatedCommand>> {
        let Link::Distributed { transport, mode } = &self.link else {
            return Ok(Vec::new());
        };

        let mut commands = Vec::new();
        while let Some(frame) = transport.recv()? {
            self.received.fetch_add(1, Ordering::Relaxed);
            match ReplicatedCommand::decode(&frame) {
                Ok(command) => commands.push(command),
                Err(e) => {
                    tracing::warn!(%mode, bytes = frame.len(), error = %e, "dropping undecodable frame");
                }
            }
        }
        Ok(commands)
    }

    /// Commands broadcast by this participant
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Frames received by this participant
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ReplicationGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationGateway")
            .field("mode", &self.mode())
            .field("sent", &self.sent())
            .field("received", &self.received())
            .finish()
    }
}
