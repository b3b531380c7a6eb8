/// Generate a new row identifier.
pub fn generate_id() -> String {
    nanoid::nanoid!()
}
