use crate::BindMarkers;

/// The clause currently being rendered, used by [`crate::SqlWriter`] methods
/// to adjust output (column qualification, marker placement).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectWhere,
    SqlSelectOrderBy,
}

/// Mutable render state threaded through a single SQL rendering pass. Holds
/// the bind marker allocator, so placeholder ordinals are monotonic across
/// the whole statement and reset between renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub fragment: Fragment,
    pub qualify_columns: bool,
    pub markers: BindMarkers,
}

impl Context {
    pub fn new(fragment: Fragment, qualify_columns: bool, markers: BindMarkers) -> Self {
        Self {
            fragment,
            qualify_columns,
            markers,
        }
    }

    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        ContextUpdater {
            current: Context {
                fragment,
                ..self.clone()
            },
            previous: self,
        }
    }
}

pub struct ContextUpdater<'a> {
    pub current: Context,
    pub previous: &'a mut Context,
}

impl<'a> Drop for ContextUpdater<'a> {
    fn drop(&mut self) {
        self.previous.markers = self.current.markers.clone();
    }
}
