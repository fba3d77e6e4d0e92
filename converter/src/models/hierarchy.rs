//! Cascading location lists seeded into the `choices` sheet.
//!
//! A hierarchy is an ordered list of levels. Each level is one choice list;
//! items of a level below the top carry the name of their parent item in a
//! column named after the parent level's list (the XLSForm `choice_filter`
//! convention, e.g. `district` rows carry a `governorate` column).
//!
//! The built-in [`LocationHierarchy::default`] is a small sample of three
//! levels. Real deployments load their own from JSON:
//!
//! ```json
//! { "levels": [
//!     { "list_name": "governorate", "items": [
//!         { "name": "baghdad", "label_english": "Baghdad", "label_arabic": "بغداد" } ] },
//!     { "list_name": "district", "items": [
//!         { "name": "district1", "label_english": "District 1",
//!           "label_arabic": "المنطقة 1", "parent": "baghdad" } ] }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::table::{Row, Table};
use super::Column;
use crate::error::{HierarchyError, HierarchyResult};
use crate::text::is_blank;

/// One selectable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyItem {
    pub name: String,
    pub label_english: String,
    pub label_arabic: String,
    /// Name of the parent item in the previous level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// One choice list of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub list_name: String,
    pub items: Vec<HierarchyItem>,
}

/// Ordered levels, top first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationHierarchy {
    pub levels: Vec<HierarchyLevel>,
}

impl LocationHierarchy {
    /// Parse and check a hierarchy from JSON text.
    pub fn from_json(content: &str) -> HierarchyResult<Self> {
        let hierarchy: Self = serde_json::from_str(content)?;
        hierarchy.check()?;
        Ok(hierarchy)
    }

    /// Load a hierarchy file.
    pub fn load(path: impl AsRef<Path>) -> HierarchyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Verify list names are present and every parent reference resolves.
    pub fn check(&self) -> HierarchyResult<()> {
        let mut parents: Option<HashSet<&str>> = None;
        for (i, level) in self.levels.iter().enumerate() {
            if is_blank(Some(level.list_name.as_str())) {
                return Err(HierarchyError::MissingListName(i));
            }
            if let Some(ref known) = parents {
                for item in &level.items {
                    let parent = item.parent.as_deref().unwrap_or_default();
                    if !known.contains(parent) {
                        return Err(HierarchyError::UnknownParent {
                            list: level.list_name.clone(),
                            item: item.name.clone(),
                            parent: parent.to_string(),
                        });
                    }
                }
            }
            parents = Some(level.items.iter().map(|it| it.name.as_str()).collect());
        }
        Ok(())
    }

    /// List identifiers reserved by this hierarchy.
    pub fn list_names(&self) -> Vec<&str> {
        self.levels.iter().map(|l| l.list_name.as_str()).collect()
    }

    /// Total number of items over all levels.
    pub fn item_count(&self) -> usize {
        self.levels.iter().map(|l| l.items.len()).sum()
    }

    /// Choice rows for every level, top level first.
    pub fn to_table(&self) -> Table {
        let mut table = Table::with_columns([
            Column::ListName.as_str(),
            Column::Name.as_str(),
            Column::LabelEnglish.as_str(),
            Column::LabelArabic.as_str(),
        ]);

        let mut parent_column: Option<&str> = None;
        for level in &self.levels {
            if let Some(column) = parent_column {
                table.ensure_column(column);
            }
            for item in &level.items {
                let mut row = Row::from_pairs([
                    (Column::ListName.as_str(), level.list_name.as_str()),
                    (Column::Name.as_str(), item.name.as_str()),
                    (Column::LabelEnglish.as_str(), item.label_english.as_str()),
                    (Column::LabelArabic.as_str(), item.label_arabic.as_str()),
                ]);
                if let (Some(column), Some(parent)) = (parent_column, item.parent.as_deref()) {
                    row.set(column, parent);
                }
                table.push_row(row);
            }
            parent_column = Some(level.list_name.as_str());
        }
        table
    }
}

fn item(name: &str, en: &str, ar: &str, parent: Option<&str>) -> HierarchyItem {
    HierarchyItem {
        name: name.to_string(),
        label_english: en.to_string(),
        label_arabic: ar.to_string(),
        parent: parent.map(String::from),
    }
}

impl Default for LocationHierarchy {
    /// Sample governorate → district → subdistrict data.
    fn default() -> Self {
        Self {
            levels: vec![
                HierarchyLevel {
                    list_name: "governorate".to_string(),
                    items: vec![
                        item("baghdad", "Baghdad", "بغداد", None),
                        item("basra", "Basra", "البصرة", None),
                        item("erbil", "Erbil", "أربيل", None),
                    ],
                },
                HierarchyLevel {
                    list_name: "district".to_string(),
                    items: vec![
                        item("district1", "District 1", "المنطقة 1", Some("baghdad")),
                        item("district2", "District 2", "المنطقة 2", Some("baghdad")),
                        item("district3", "District 3", "المنطقة 3", Some("basra")),
                    ],
                },
                HierarchyLevel {
                    list_name: "subdistrict".to_string(),
                    items: vec![
                        item("subdistrict1", "Subdistrict 1", "الناحية 1", Some("district1")),
                        item("subdistrict2", "Subdistrict 2", "الناحية 2", Some("district1")),
                        item("subdistrict3", "Subdistrict 3", "الناحية 3", Some("district2")),
                    ],
                },
            ],
        }
    }
}
