/// Page sizes offered in the items-per-page selector
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [6, 10, 30, 50, 100];

pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Current page (1-based) and page size over a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: snap_page_size(page_size),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Set the page size; always goes back to page 1
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = snap_page_size(size);
        self.page = 1;
    }

    /// Step to the next larger option, wrapping to the smallest
    pub fn cycle_page_size_up(&mut self) {
        let idx = option_index(self.page_size);
        self.set_page_size(PAGE_SIZE_OPTIONS[(idx + 1) % PAGE_SIZE_OPTIONS.len()]);
    }

    /// Step to the next smaller option, wrapping to the largest
    pub fn cycle_page_size_down(&mut self) {
        let idx = option_index(self.page_size);
        let len = PAGE_SIZE_OPTIONS.len();
        self.set_page_size(PAGE_SIZE_OPTIONS[(idx + len - 1) % len]);
    }

    /// `ceil(len / page_size)`; zero for an empty list
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    pub fn next(&mut self, len: usize) {
        let last = self.total_pages(len).max(1);
        self.page = (self.page + 1).min(last);
    }

    pub fn previous(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn is_first(&self) -> bool {
        self.page <= 1
    }

    pub fn is_last(&self, len: usize) -> bool {
        self.page >= self.total_pages(len)
    }

    /// Pull the page back in range after the list shrank
    pub fn clamp(&mut self, len: usize) {
        self.page = self.page.clamp(1, self.total_pages(len).max(1));
    }

    /// Records on the current page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

fn option_index(size: usize) -> usize {
    PAGE_SIZE_OPTIONS
        .iter()
        .position(|&o| o == size)
        .unwrap_or(0)
}

/// Smallest option that holds `size` records, or the largest option
fn snap_page_size(size: usize) -> usize {
    PAGE_SIZE_OPTIONS
        .iter()
        .copied()
        .find(|&o| o >= size)
        .unwrap_or(PAGE_SIZE_OPTIONS[PAGE_SIZE_OPTIONS.len() - 1])
}
