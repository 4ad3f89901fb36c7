/// Maps a raw detector label to the vocabulary used in reports.
/// Labels without a mapping pass through unchanged.
pub fn translate(label: &str) -> &str {
    match label {
        "person" => "pedestrian",
        "truck" => "lorry",
        "van" => "car",
        "bicycle" => "cyclist",
        "dog" | "cat" | "bird" => "animal",
        other => other,
    }
}
