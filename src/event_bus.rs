use crate::events::*;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::thread::JoinHandle;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send>;

pub(crate) struct EventHandlers {
    pub(crate) insert_block_handlers: Vec<HandlerPtr<InsertBlockEvent>>,
    pub(crate) new_canonical_head_handlers: Vec<HandlerPtr<NewCanonicalHeadEvent>>,
    pub(crate) reorg_handlers: Vec<HandlerPtr<ReorgEvent>>,
    pub(crate) set_head_handlers: Vec<HandlerPtr<SetHeadEvent>>,
    pub(crate) logs_added_handlers: Vec<HandlerPtr<LogsAddedEvent>>,
    pub(crate) logs_removed_handlers: Vec<HandlerPtr<LogsRemovedEvent>>,
}

impl EventHandlers {
    pub fn fire_handlers(&self, event: Event) {
        match event {
            Event::InsertBlock(insert_block_event) => self
                .insert_block_handlers
                .iter()
                .for_each(|handler| handler(&insert_block_event)),

            Event::NewCanonicalHead(new_canonical_head_event) => self
                .new_canonical_head_handlers
                .iter()
                .for_each(|handler| handler(&new_canonical_head_event)),

            Event::Reorg(reorg_event) => self
                .reorg_handlers
                .iter()
                .for_each(|handler| handler(&reorg_event)),

            Event::SetHead(set_head_event) => self
                .set_head_handlers
                .iter()
                .for_each(|handler| handler(&set_head_event)),

            Event::LogsAdded(logs_added_event) => self
                .logs_added_handlers
                .iter()
                .for_each(|handler| handler(&logs_added_event)),

            Event::LogsRemoved(logs_removed_event) => self
                .logs_removed_handlers
                .iter()
                .for_each(|handler| handler(&logs_removed_event)),
        }
    }
}

pub(crate) fn start_event_bus(
    event_handlers: EventHandlers,
    event_subscriber: Receiver<Event>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => return,
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("event_bus thread disconnected from main thread")
            }
        }

        match event_subscriber.try_recv() {
            Ok(event) => event_handlers.fire_handlers(event),
            Err(TryRecvError::Empty) => thread::yield_now(),
            Err(TryRecvError::Disconnected) => {
                panic!("the chain store (event publisher) was disconnected from the channel")
            }
        }
    })
}
