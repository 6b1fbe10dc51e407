use serde::{Deserialize, Serialize};

/// Static data about a kind of item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemType {
    /// Type id, e.g. `bandages`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category id, e.g. `medical`.
    #[serde(default)]
    pub category: String,
    /// Price of one unit.
    #[serde(default)]
    pub price: i64,
    /// Whether the item is counted by charges rather than by number of items.
    #[serde(default)]
    pub count_by_charges: bool,
}

impl ItemType {
    /// Create an item type.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            price,
            count_by_charges: false,
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Count this type by charges.
    pub fn by_charges(mut self) -> Self {
        self.count_by_charges = true;
        self
    }
}

/// A concrete item held by a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Type id.
    pub type_id: String,
    /// Category id of the item type.
    #[serde(default)]
    pub category: String,
    /// Charges, for items counted by charges; 1 otherwise.
    #[serde(default = "one")]
    pub charges: i64,
    /// Items inside this one.
    #[serde(default)]
    pub contents: Vec<Item>,
}

fn one() -> i64 {
    1
}

impl Item {
    /// Create a single item of the given type.
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            category: String::new(),
            charges: 1,
            contents: Vec::new(),
        }
    }

    /// Create an item of a known type.
    pub fn of_type(item_type: &ItemType) -> Self {
        Self::new(&item_type.id).with_category(&item_type.category)
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the charges.
    pub fn with_charges(mut self, charges: i64) -> Self {
        self.charges = charges;
        self
    }

    /// Put this item inside a container of type `container`.
    pub fn in_container(self, container: impl Into<String>) -> Self {
        let mut outer = Self::new(container);
        outer.contents.push(self);
        outer
    }

    /// The category of the first item inside, if this is a filled container.
    pub fn category_of_contents(&self) -> &str {
        self.contents
            .first()
            .map(|i| i.category.as_str())
            .unwrap_or(self.category.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_wraps_item() {
        let water = Item::new("water").with_category("drinks").with_charges(2);
        let jar = water.clone().in_container("jar");
        assert_eq!(jar.type_id, "jar");
        assert_eq!(jar.contents, vec![water]);
        assert_eq!(jar.category_of_contents(), "drinks");
    }

    #[test]
    fn empty_item_uses_own_category() {
        let knife = Item::new("knife").with_category("weapons");
        assert_eq!(knife.category_of_contents(), "weapons");
    }
}
