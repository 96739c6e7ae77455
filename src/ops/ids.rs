use chrono::Utc;

/// A new id that collides with none of `taken`.
///
/// Ids are the current Unix time in milliseconds, bumped past any id
/// already in use, so ids issued in quick succession stay distinct.
pub fn fresh_id<'a>(taken: impl IntoIterator<Item = &'a str>) -> String {
    fresh_id_at(Utc::now().timestamp_millis(), taken)
}

fn fresh_id_at<'a>(now_millis: i64, taken: impl IntoIterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = taken.into_iter().collect();
    let mut candidate = now_millis;
    loop {
        let id = candidate.to_string();
        if !taken.contains(&id.as_str()) {
            return id;
        }
        candidate += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_timestamp_when_free() {
        assert_eq!(fresh_id_at(1_700_000_000_000, ["1", "2"]), "1700000000000");
    }

    #[test]
    fn bumps_past_collisions() {
        let taken = ["1700000000000", "1700000000001"];
        assert_eq!(fresh_id_at(1_700_000_000_000, taken), "1700000000002");
    }

    #[test]
    fn fresh_ids_never_collide() {
        let mut ids: Vec<String> = Vec::new();
        for _ in 0..50 {
            let id = fresh_id(ids.iter().map(String::as_str));
            assert!(!ids.contains(&id));
            ids.push(id);
        }
    }
}
