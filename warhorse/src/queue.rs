use std::collections::VecDeque;

use crate::sansio::Event;

/// Ordered buffer of events between arrival and delivery.
///
/// Bounded by backpressure rather than by dropping: ingestion asks
/// [`room`](EventQueue::room) how many frames it may take off the transport
/// and leaves the rest unread.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<Event>,
    high_water_mark: usize,
}

impl EventQueue {
    pub fn new(high_water_mark: usize) -> Self {
        EventQueue {
            events: VecDeque::new(),
            high_water_mark: high_water_mark.max(1),
        }
    }

    pub fn enqueue(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Remove up to `max_count` events from the head, oldest first.
    pub fn drain(&mut self, max_count: usize) -> Vec<Event> {
        let n = max_count.min(self.events.len());
        self.events.drain(..n).collect()
    }

    /// How many more events fit below the high-water mark.
    pub fn room(&self) -> usize {
        self.high_water_mark.saturating_sub(self.events.len())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sansio::EventKind;

    #[test]
    fn test_drain_fifo() {
        let mut queue = EventQueue::new(16);
        for i in 0..5 {
            queue.enqueue(Event::new(EventKind::ChatMessage, i.to_string()));
        }

        let first: Vec<_> = queue.drain(3).iter().map(|e| e.payload().to_owned()).collect();
        assert_eq!(first, ["0", "1", "2"]);

        let rest: Vec<_> = queue.drain(10).iter().map(|e| e.payload().to_owned()).collect();
        assert_eq!(rest, ["3", "4"]);
    }

    #[test]
    fn test_drain_empty() {
        let mut queue = EventQueue::new(4);
        assert!(queue.drain(10).is_empty());
        assert!(queue.drain(0).is_empty());
    }

    #[test]
    fn test_room() {
        let mut queue = EventQueue::new(2);
        assert_eq!(queue.room(), 2);
        queue.enqueue(Event::new(EventKind::Hello, "null"));
        queue.enqueue(Event::new(EventKind::LoggedIn, "null"));
        assert_eq!(queue.room(), 0);

        // lifecycle diagnostics may still go past the mark
        queue.enqueue(Event::new(EventKind::Error, "\"lost\""));
        assert_eq!(queue.room(), 0);
        assert_eq!(queue.len(), 3);

        queue.drain(2);
        assert_eq!(queue.room(), 1);
    }
}
