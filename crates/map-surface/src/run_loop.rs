// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-thread cooperative task queue.
//!
//! Engines post deferred work (observer notifications, completion callbacks)
//! to the run loop of the thread they run on. The map handle makes sure one
//! exists and drains it after every frame. A run loop lives as long as
//! something holds an `Rc` to it; the thread-local slot only keeps a weak
//! reference.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static CURRENT: RefCell<Weak<RunLoop>> = RefCell::new(Weak::new());
}

/// Queue of deferred tasks bound to one thread.
pub struct RunLoop {
    tasks: RefCell<VecDeque<Task>>,
}

impl fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoop")
            .field("pending", &self.pending())
            .finish()
    }
}

impl RunLoop {
    /// The run loop of the calling thread, if one is alive.
    #[must_use]
    pub fn current() -> Option<Rc<Self>> {
        CURRENT.with(|slot| slot.borrow().upgrade())
    }

    /// Return the calling thread's run loop, creating it if none is alive.
    #[must_use]
    pub fn get_or_create() -> Rc<Self> {
        CURRENT.with(|slot| {
            if let Some(existing) = slot.borrow().upgrade() {
                return existing;
            }
            debug!("Creating run loop for {:?}", std::thread::current().id());
            let created = Rc::new(Self {
                tasks: RefCell::new(VecDeque::new()),
            });
            *slot.borrow_mut() = Rc::downgrade(&created);
            created
        })
    }

    /// Post to the current run loop, or run inline when the thread has none.
    pub fn post_or_run(task: impl FnOnce() + 'static) {
        match Self::current() {
            Some(run_loop) => run_loop.post(task),
            None => task(),
        }
    }

    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run queued tasks until the queue is empty, including tasks posted by
    /// the tasks themselves. Returns how many ran.
    pub fn run_once(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.tasks.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }
}

impl Drop for RunLoop {
    fn drop(&mut self) {
        let pending = self.tasks.get_mut().len();
        if pending > 0 {
            debug!("Dropping run loop with {pending} pending task(s)");
        }
    }
}
