use shared::domain::Place;

/// Visited log as shown to a user: duplicates (equal in every field) are
/// collapsed, first visit wins the position. The log itself is left alone.
pub fn visited_history(visited: &[Place]) -> Vec<Place> {
    let mut unique: Vec<Place> = Vec::with_capacity(visited.len());
    for place in visited {
        if !unique.contains(place) {
            unique.push(place.clone());
        }
    }
    unique
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
