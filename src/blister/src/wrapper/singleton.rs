use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use oneshot::{Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::container::{Container, ContainerError, Object, WeakContainer};
use crate::kind::Kind;
use crate::wrapper::{DefinitionFn, Link, Original, Resolver};

/// Runs its definition at most once successfully, against the container it
/// is stored in, and caches the result.
///
/// Concurrent first requests are serialized: the first thread constructs
/// the object while the others wait for its outcome. A failed construction
/// is not cached, so the next request runs the definition (and the previous
/// definition it extends) again. A panicking definition counts as a failed
/// construction: waiters get [`ContainerError::DefinitionPanicked`] and the
/// panic carries on in the constructing thread.
pub struct SingletonResolver {
    owner: WeakContainer,
    state: Mutex<SingletonState>,
}

impl SingletonResolver {
    pub fn new(definition: DefinitionFn, owner: WeakContainer, original: Option<Link>) -> Self {
        Self {
            owner,
            state: Mutex::new(SingletonState::Uncomputed {
                definition,
                original,
            }),
        }
    }

    fn owner(&self) -> Container {
        match self.owner.upgrade() {
            Some(owner) => owner,
            // A resolver is only reachable through a container which keeps
            // its own entries and all of its ancestors alive.
            None => unreachable!("the owning container should outlive its resolvers"),
        }
    }

    fn stop_construction_on_cyclic_dependency(&self, id: &str) -> ContainerError {
        debug!(id, "singleton requested again while being constructed");
        ContainerError::CyclicDependency { id: id.to_owned() }
    }

    fn register_waiter(&self, mut state: MutexGuard<'_, SingletonState>) -> Receiver<WaitResponse> {
        let (sender, receiver) = oneshot::channel();
        let SingletonState::Constructing { waiters, .. } = &mut *state else {
            unreachable!("the state should be checked before calling this method")
        };
        waiters.push(sender);
        receiver
    }

    fn wait_for_constructed_object(
        &self,
        receiver: Receiver<WaitResponse>,
    ) -> Result<Object, ContainerError> {
        match receiver.recv() {
            Ok(WaitResponse::Constructed(obj)) => Ok(obj),
            Ok(WaitResponse::Error(err)) => Err(err),
            Err(_) => unreachable!("the constructing thread should send a response"),
        }
    }

    fn construct(
        &self,
        mut state: MutexGuard<'_, SingletonState>,
        id: &str,
    ) -> Result<Object, ContainerError> {
        let constructing = SingletonState::Constructing {
            on_thread: thread::current().id(),
            waiters: Vec::new(),
        };
        let SingletonState::Uncomputed {
            definition,
            original,
        } = mem::replace(&mut *state, constructing)
        else {
            unreachable!("the state should be checked before calling this method")
        };
        drop(state);

        let owner = self.owner();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            definition(Original::new(id, original.as_ref(), &owner), &owner)
        }));
        let (res, panicked) = match attempt {
            Ok(res) => (res, None),
            Err(payload) => {
                let err = ContainerError::DefinitionPanicked { id: id.to_owned() };
                (Err(err), Some(payload))
            }
        };

        let next = match &res {
            Ok(obj) => {
                debug!(id, "singleton constructed");
                SingletonState::Computed(Arc::clone(obj))
            }
            Err(err) => {
                debug!(id, error = %err, "singleton construction failed");
                SingletonState::Uncomputed {
                    definition,
                    original,
                }
            }
        };
        let SingletonState::Constructing { waiters, .. } =
            mem::replace(&mut *self.state.lock(), next)
        else {
            unreachable!("only the constructing thread should leave the constructing state")
        };

        let response = match &res {
            Ok(obj) => WaitResponse::Constructed(Arc::clone(obj)),
            Err(err) => WaitResponse::Error(err.clone()),
        };
        for sender in waiters {
            let _ = sender.send(response.clone());
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        res
    }
}

impl Resolver for SingletonResolver {
    fn kind(&self) -> Kind {
        Kind::Singleton
    }

    fn resolve(&self, id: &str, _context: &Container) -> Result<Object, ContainerError> {
        let state = self.state.lock();
        match &*state {
            SingletonState::Computed(obj) => {
                trace!(id, "singleton cache hit");
                Ok(Arc::clone(obj))
            }
            SingletonState::Constructing { on_thread, .. } => {
                if *on_thread == thread::current().id() {
                    Err(self.stop_construction_on_cyclic_dependency(id))
                } else {
                    let receiver = self.register_waiter(state);
                    self.wait_for_constructed_object(receiver)
                }
            }
            SingletonState::Uncomputed { .. } => self.construct(state, id),
        }
    }
}

enum SingletonState {
    Uncomputed {
        definition: DefinitionFn,
        original: Option<Link>,
    },
    Constructing {
        on_thread: ThreadId,
        waiters: Vec<Sender<WaitResponse>>,
    },
    Computed(Object),
}

#[derive(Clone)]
enum WaitResponse {
    Constructed(Object),
    Error(ContainerError),
}
