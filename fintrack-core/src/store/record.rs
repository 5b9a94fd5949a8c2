use super::document::{Document, Table};

/// A record kind that lives in one sequence collection of the document.
pub trait Record: Clone {
    /// Partial update applied by [`Record::apply_patch`].
    type Patch;

    /// Collection this record kind is stored in.
    const TABLE: Table;

    fn id(&self) -> &str;

    fn collection(doc: &Document) -> &Vec<Self>;

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self>;

    /// Merges the patch over the record field by field. Fields absent from
    /// the patch keep their value; `id` and `createdAt` never change.
    fn apply_patch(&mut self, patch: Self::Patch);
}
