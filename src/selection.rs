use rust_decimal::Decimal;

use crate::model::Book;

pub type SubscriberId = u64;

type Listener = Box<dyn Fn(&[Book]) + Send>;

/// The set of books the user has picked for an order. Insertion order is
/// preserved, identifiers are unique, and every change is pushed to
/// subscribers synchronously within the mutating call.
pub struct SelectionRegistry {
    books: Vec<Book>,
    min_checkout: usize,
    next_subscriber: SubscriberId,
    subscribers: Vec<(SubscriberId, Listener)>,
}

impl SelectionRegistry {
    /// `min_checkout` is the smallest selection size that permits checkout.
    pub fn new(min_checkout: usize) -> Self {
        Self {
            books: Vec::new(),
            min_checkout,
            next_subscriber: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.books.iter().any(|book| book.id == Some(id))
    }

    /// Appends `book` unless its identifier is already selected. Books that
    /// have not been persisted yet carry no identifier and cannot be
    /// selected. Returns whether the set changed.
    pub fn add(&mut self, book: Book) -> bool {
        let Some(id) = book.id else {
            tracing::warn!(title = %book.title, "ignoring selection of a book without an id");
            return false;
        };
        if self.contains(id) {
            return false;
        }
        self.books.push(book);
        self.notify();
        true
    }

    /// Removes the book with `id`. Removing a non-member is a no-op.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.books.len();
        self.books.retain(|book| book.id != Some(id));
        let changed = self.books.len() != before;
        if changed {
            self.notify();
        }
        changed
    }

    pub fn toggle(&mut self, book: Book) {
        match book.id {
            Some(id) if self.contains(id) => {
                self.remove(id);
            }
            _ => {
                self.add(book);
            }
        }
    }

    pub fn clear(&mut self) {
        if self.books.is_empty() {
            return;
        }
        self.books.clear();
        self.notify();
    }

    /// Exact sum of member prices. Decimal arithmetic keeps order totals free
    /// of floating-point drift.
    pub fn total_price(&self) -> Decimal {
        self.books.iter().map(|book| book.price).sum()
    }

    pub fn min_checkout(&self) -> usize {
        self.min_checkout
    }

    pub fn can_checkout(&self) -> bool {
        self.books.len() >= self.min_checkout
    }

    /// Registers a listener invoked synchronously, with the new contents, on
    /// every mutation that changes the set.
    pub fn subscribe(&mut self, listener: impl Fn(&[Book]) + Send + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
    }

    fn notify(&self) {
        for (_, listener) in &self.subscribers {
            listener(&self.books);
        }
    }
}
