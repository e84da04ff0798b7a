use serde::{Deserialize, Serialize, Serializer};

use crate::store::preferences::KeyValueStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    Five,
    #[default]
    Ten,
    TwentyFive,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Five,
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
    ];

    pub fn get(self) -> u32 {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        PageSize::ALL.into_iter().find(|s| s.get() == value)
    }

    fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().and_then(Self::from_value)
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u32::deserialize(deserializer)?;
        PageSize::from_value(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported page size {}", value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLink::Page(n) => serializer.serialize_u32(*n),
            PageLink::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

pub fn total_pages(total_items: usize, page_size: PageSize) -> u32 {
    let size = page_size.get() as usize;
    (total_items.div_ceil(size)).max(1) as u32
}

/// Compact page list: all pages up to five, otherwise first/last with ellipses around
/// the current position.
pub fn page_numbers(current: u32, total: u32) -> Vec<PageLink> {
    use PageLink::{Ellipsis, Page};

    if total <= 5 {
        return (1..=total).map(Page).collect();
    }
    if current <= 3 {
        vec![Page(1), Page(2), Page(3), Ellipsis, Page(total)]
    } else if current >= total - 2 {
        vec![
            Page(1),
            Ellipsis,
            Page(total - 2),
            Page(total - 1),
            Page(total),
        ]
    } else {
        vec![Page(1), Ellipsis, Page(current), Ellipsis, Page(total)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: u32,
    page_size: PageSize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl Paginator {
    pub fn new(page_size: PageSize) -> Self {
        Self { page: 1, page_size }
    }

    pub fn at(page: u32, page_size: PageSize) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn total_pages(&self, total_items: usize) -> u32 {
        total_pages(total_items, self.page_size)
    }

    /// A page past the end (the collection shrank) falls back to page one.
    pub fn effective_page(&self, total_items: usize) -> u32 {
        if self.page > self.total_pages(total_items) {
            1
        } else {
            self.page
        }
    }

    pub fn go_to_page(&mut self, page: u32, total_items: usize) {
        self.page = page.clamp(1, self.total_pages(total_items));
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 1;
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let size = self.page_size.get() as usize;
        let page = self.effective_page(items.len()) as usize;
        let start = ((page - 1) * size).min(items.len());
        let end = (start + size).min(items.len());
        &items[start..end]
    }

    pub fn page_numbers(&self, total_items: usize) -> Vec<PageLink> {
        page_numbers(
            self.effective_page(total_items),
            self.total_pages(total_items),
        )
    }

    /// Restores a persisted page size; anything unrecognized yields the default.
    pub fn restore(storage: &dyn KeyValueStorage, key: &str) -> Self {
        let size = storage
            .get(key)
            .as_deref()
            .and_then(PageSize::parse)
            .unwrap_or_default();
        Self::new(size)
    }

    pub fn persist(&self, storage: &dyn KeyValueStorage, key: &str) -> crate::error::Result<()> {
        storage.set(key, &self.page_size.get().to_string())
    }
}
