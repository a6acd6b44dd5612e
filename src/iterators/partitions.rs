///
/// Non-increasing `ndim`-tuples of non-negative integers with sum at most
/// `budget`. Tuples are grouped by their sum in increasing order and, within
/// one sum, listed in reverse lexicographic order, e.g. for `ndim = 3` and
/// sum 4: `[4,0,0] [3,1,0] [2,2,0] [2,1,1]`.
///
#[derive(Clone, Debug)]
pub struct Partitions
{
    budget: usize,
    total: usize,
    current: Vec<usize>,
    first: bool,
    done: bool,
}

impl Partitions
{
    pub fn new(ndim: usize, budget: usize) -> Self
    {
        Self { budget, total: 0, current: vec![0; ndim], first: true, done: false }
    }

    pub fn ndim(&self) -> usize
    {
        self.current.len()
    }

    ///
    /// Step to the next partition with the same sum: decrease the rightmost
    /// entry whose remainder still fits behind it, then refill greedily.
    ///
    fn advance_within_total(&mut self) -> bool
    {
        let ndim = self.ndim();
        let mut tail = 0;
        for i in (0..ndim).rev()
        {
            let v = self.current[i];
            if v > 0 && tail < (ndim - 1 - i) * (v - 1)
            {
                self.current[i] -= 1;
                let cap = self.current[i];
                let mut remaining = tail + 1;
                for entry in self.current[i + 1..].iter_mut()
                {
                    *entry = cap.min(remaining);
                    remaining -= *entry;
                }
                return true;
            }
            tail += v;
        }
        false
    }
}

impl Iterator for Partitions
{
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done
        {
            return None;
        }
        if self.first
        {
            self.first = false;
            // only the empty tuple exists without dimensions
            self.done = self.current.is_empty();
            return Some(self.current.clone());
        }
        if !self.advance_within_total()
        {
            self.total += 1;
            if self.total > self.budget
            {
                self.done = true;
                return None;
            }
            self.current.fill(0);
            self.current[0] = self.total;
        }
        Some(self.current.clone())
    }
}

#[test]
fn test_partitions_of_four()
{
    let partitions: Vec<_> = Partitions::new(3, 4).filter(|p| p.iter().sum::<usize>() == 4).collect();
    assert_eq!(partitions, vec![vec![4, 0, 0], vec![3, 1, 0], vec![2, 2, 0], vec![2, 1, 1]]);
}

#[test]
fn test_partitions_grouped_by_sum()
{
    let sums: Vec<usize> = Partitions::new(2, 3).map(|p| p.iter().sum()).collect();
    assert_eq!(sums, vec![0, 1, 2, 2, 3, 3]);
    assert_eq!(Partitions::new(0, 3).count(), 1);
    assert_eq!(Partitions::new(1, 0).collect::<Vec<_>>(), vec![vec![0]]);
}
