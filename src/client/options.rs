use std::collections::BTreeSet;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
pub const ALL_DAYS: &str = "All days";
pub const TIME_SLOTS: [&str; 3] = ["Morning", "Afternoon", "Evening"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Days,
    Times,
}

/// Checkbox group for an enumerable answer.
///
/// The selected options are the only state. The day selector's "All days"
/// entry is derived from them: it reads as checked when all seven days are,
/// and toggling it selects or clears all seven. It never appears in the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSelector {
    kind: SelectorKind,
    options: &'static [&'static str],
    selected: BTreeSet<usize>,
}

impl OptionSelector {
    pub fn days() -> Self {
        Self {
            kind: SelectorKind::Days,
            options: &WEEKDAYS,
            selected: BTreeSet::new(),
        }
    }

    pub fn times() -> Self {
        Self {
            kind: SelectorKind::Times,
            options: &TIME_SLOTS,
            selected: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn options(&self) -> &'static [&'static str] {
        self.options
    }

    /// What a front end should render, meta-option included.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::with_capacity(self.options.len() + 1);
        if self.kind == SelectorKind::Days {
            labels.push(ALL_DAYS);
        }
        labels.extend_from_slice(self.options);
        labels
    }

    fn is_meta(&self, option: &str) -> bool {
        self.kind == SelectorKind::Days && option == ALL_DAYS
    }

    fn index_of(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|o| *o == option)
    }

    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.options.len()
    }

    pub fn is_checked(&self, option: &str) -> bool {
        if self.is_meta(option) {
            return self.all_selected();
        }
        self.index_of(option)
            .map_or(false, |i| self.selected.contains(&i))
    }

    /// Sets one checkbox. Returns false for an option this selector lacks.
    pub fn set(&mut self, option: &str, checked: bool) -> bool {
        if self.is_meta(option) {
            if checked {
                self.selected = (0..self.options.len()).collect();
            } else {
                self.selected.clear();
            }
            return true;
        }

        let Some(index) = self.index_of(option) else {
            return false;
        };
        if checked {
            self.selected.insert(index);
        } else {
            self.selected.remove(&index);
        }
        true
    }

    /// Flips one checkbox; `None` for an unknown option, else the new state.
    pub fn toggle(&mut self, option: &str) -> Option<bool> {
        let checked = !self.is_checked(option);
        if self.set(option, checked) {
            Some(checked)
        } else {
            None
        }
    }

    pub fn selected(&self) -> Vec<&'static str> {
        self.selected.iter().map(|&i| self.options[i]).collect()
    }

    /// The comma-joined answer in option order, or `None` when nothing is checked.
    pub fn answer(&self) -> Option<String> {
        if self.selected.is_empty() {
            return None;
        }
        Some(self.selected().join(", "))
    }
}
