pub mod fields;
pub mod next_data;
pub mod slug;
pub mod streams;

use streams::StreamRecord;

/// Page pipeline: HTML → embedded state → stream nodes → records.
pub fn process_page(html: &str, max_streams: usize) -> Vec<StreamRecord> {
    let data = next_data::extract_next_data(html);
    streams::parse_streams(data.as_ref(), max_streams)
}
