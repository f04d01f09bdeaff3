//! In-process process group: one thread per rank, rendezvous channels
//! between every ordered pair of ranks.

use std::any::Any;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use super::transport::{Communicator, TransportError};

/// Endpoint of one rank in a [`LocalWorld`].
pub struct LocalCommunicator {
    rank: usize,
    world_size: usize,
    /// Indexed by destination rank; `None` at our own rank.
    outboxes: Vec<Option<SyncSender<Vec<f64>>>>,
    /// Indexed by source rank; `None` at our own rank.
    inboxes: Vec<Option<Receiver<Vec<f64>>>>,
}

impl LocalCommunicator {
    fn check_peer(&self, peer: usize) -> Result<(), TransportError> {
        if peer >= self.world_size {
            return Err(TransportError::InvalidPeer {
                peer,
                world_size: self.world_size,
            });
        }
        if peer == self.rank {
            return Err(TransportError::SelfMessage { rank: self.rank });
        }
        Ok(())
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn send(&self, dest: usize, payload: &[f64]) -> Result<(), TransportError> {
        self.check_peer(dest)?;
        let outbox = self.outboxes[dest]
            .as_ref()
            .ok_or(TransportError::Disconnected { peer: dest })?;
        log::trace!("rank {} -> {}: {} values", self.rank, dest, payload.len());
        // Zero-capacity channel: blocks until `dest` calls `receive`.
        outbox
            .send(payload.to_vec())
            .map_err(|_| TransportError::Disconnected { peer: dest })
    }

    fn receive(&self, source: usize, buffer: &mut [f64]) -> Result<(), TransportError> {
        self.check_peer(source)?;
        let inbox = self.inboxes[source]
            .as_ref()
            .ok_or(TransportError::Disconnected { peer: source })?;
        let message = inbox
            .recv()
            .map_err(|_| TransportError::Disconnected { peer: source })?;
        if message.len() != buffer.len() {
            return Err(TransportError::LengthMismatch {
                peer: source,
                expected: buffer.len(),
                received: message.len(),
            });
        }
        log::trace!("rank {} <- {}: {} values", self.rank, source, message.len());
        buffer.copy_from_slice(&message);
        Ok(())
    }
}

/// A fully connected group of [`LocalCommunicator`]s.
pub struct LocalWorld {
    communicators: Vec<LocalCommunicator>,
}

impl LocalWorld {
    /// Build a group of `world_size` ranks.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidPeer`] if `world_size == 0`.
    pub fn new(world_size: usize) -> Result<Self, TransportError> {
        if world_size == 0 {
            return Err(TransportError::InvalidPeer {
                peer: 0,
                world_size,
            });
        }
        let mut communicators: Vec<LocalCommunicator> = (0..world_size)
            .map(|rank| LocalCommunicator {
                rank,
                world_size,
                outboxes: (0..world_size).map(|_| None).collect(),
                inboxes: (0..world_size).map(|_| None).collect(),
            })
            .collect();

        for src in 0..world_size {
            for dst in 0..world_size {
                if src == dst {
                    continue;
                }
                let (tx, rx) = sync_channel(0);
                communicators[src].outboxes[dst] = Some(tx);
                communicators[dst].inboxes[src] = Some(rx);
            }
        }
        Ok(Self { communicators })
    }

    pub fn world_size(&self) -> usize {
        self.communicators.len()
    }

    /// Hand out the endpoints, in rank order.
    pub fn into_communicators(self) -> Vec<LocalCommunicator> {
        self.communicators
    }

    /// Run `f` once per rank, each on its own scoped thread, and return the
    /// results in rank order.
    ///
    /// A panic on any rank is propagated to the caller after every thread has
    /// been joined. When a rank exits early its channels close, so peers
    /// blocked on it fail with [`TransportError::Disconnected`] instead of
    /// hanging.
    pub fn run<F, R>(self, f: F) -> Vec<R>
    where
        F: Fn(LocalCommunicator) -> R + Sync,
        R: Send,
    {
        let f = &f;
        std::thread::scope(|s| {
            let handles: Vec<_> = self
                .communicators
                .into_iter()
                .map(|comm| {
                    std::thread::Builder::new()
                        .name(format!("rank-{}", comm.rank))
                        .spawn_scoped(s, move || f(comm))
                })
                .collect();

            let mut results = Vec::with_capacity(handles.len());
            let mut panic: Option<Box<dyn Any + Send>> = None;
            for handle in handles {
                match handle {
                    Ok(h) => match h.join() {
                        Ok(r) => results.push(r),
                        Err(payload) => panic = panic.or(Some(payload)),
                    },
                    Err(e) => panic = panic.or(Some(Box::new(e.to_string()))),
                }
            }
            if let Some(payload) = panic {
                std::panic::resume_unwind(payload);
            }
            results
        })
    }
}

/// Build a [`LocalWorld`] of `world_size` ranks and [`run`](LocalWorld::run)
/// `f` on it.
pub fn run_local<F, R>(world_size: usize, f: F) -> Result<Vec<R>, TransportError>
where
    F: Fn(LocalCommunicator) -> R + Sync,
    R: Send,
{
    Ok(LocalWorld::new(world_size)?.run(f))
}
