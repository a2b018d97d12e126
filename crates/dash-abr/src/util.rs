/// Highest bitrate that does not exceed `throughput_bps`, falling back to
/// the lowest bitrate when even that one doesn't fit (never returns
/// `None` as long as `bitrates_sorted_asc` is non-empty).
pub fn pick_at_or_below(bitrates_sorted_asc: &[u64], throughput_bps: f64) -> Option<u64> {
    let mut chosen = bitrates_sorted_asc.first().copied();
    for &bitrate in bitrates_sorted_asc {
        if (bitrate as f64) <= throughput_bps {
            chosen = Some(bitrate);
        } else {
            break;
        }
    }
    chosen
}

pub fn index_of(bitrates_sorted_asc: &[u64], bitrate: u64) -> usize {
    bitrates_sorted_asc
        .iter()
        .position(|&b| b == bitrate)
        .unwrap_or(0)
}
