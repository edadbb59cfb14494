/// Split recipients into consecutive batches of `batch_size` (minimum 1), keeping order.
///
/// The last batch may be shorter. Every recipient lands in exactly one batch.
pub fn partition_batches<T>(recipients: &[T], batch_size: usize) -> Vec<&[T]> {
    recipients.chunks(batch_size.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_by_two() {
        let recipients = ["a", "b", "c", "d", "e"];
        let batches = partition_batches(&recipients, 2);

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(batches.concat(), recipients.to_vec());
    }

    #[test]
    fn test_zero_batch_size_treated_as_one() {
        let recipients = ["a", "b"];
        assert_eq!(partition_batches(&recipients, 0), vec![&["a"][..], &["b"][..]]);
    }

    #[test]
    fn test_batch_larger_than_list() {
        let recipients = ["a", "b"];
        assert_eq!(partition_batches(&recipients, 10), vec![&recipients[..]]);
    }

    #[test]
    fn test_duplicates_kept() {
        let recipients = ["a", "a", "a"];
        assert_eq!(partition_batches(&recipients, 2).concat().len(), 3);
    }

    #[test]
    fn test_empty_list() {
        let recipients: [&str; 0] = [];
        assert!(partition_batches(&recipients, 3).is_empty());
    }
}
