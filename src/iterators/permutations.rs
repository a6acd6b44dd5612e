///
/// Distinct rearrangements of a tuple in lexicographic order, starting from
/// its ascending arrangement.
///
#[derive(Clone, Debug)]
pub struct Permutations
{
    current: Vec<usize>,
    first: bool,
    done: bool,
}

impl Permutations
{
    pub fn new(tuple: &[usize]) -> Self
    {
        let mut current = tuple.to_vec();
        current.sort_unstable();
        Self { current, first: true, done: false }
    }

    /// Number of distinct rearrangements (multinomial coefficient).
    pub fn num_permutations(tuple: &[usize]) -> usize
    {
        let mut sorted = tuple.to_vec();
        sorted.sort_unstable();
        let mut count = 1_usize;
        let mut placed = 0;
        for run in sorted.chunk_by(|a, b| a == b)
        {
            // choose positions for this run among the ones placed so far
            for j in 1..=run.len()
            {
                placed += 1;
                count = count * placed / j;
            }
        }
        count
    }
}

fn next_permutation(v: &mut [usize]) -> bool
{
    if v.len() < 2
    {
        return false;
    }
    let mut i = v.len() - 1;
    while i > 0 && v[i - 1] >= v[i]
    {
        i -= 1;
    }
    if i == 0
    {
        return false;
    }
    let mut j = v.len() - 1;
    while v[j] <= v[i - 1]
    {
        j -= 1;
    }
    v.swap(i - 1, j);
    v[i..].reverse();
    true
}

impl Iterator for Permutations
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
            return Some(self.current.clone());
        }
        if next_permutation(&mut self.current)
        {
            Some(self.current.clone())
        }
        else
        {
            self.done = true;
            None
        }
    }
}

#[test]
fn test_permutations_of_multiset()
{
    let perms: Vec<_> = Permutations::new(&[1, 0, 1]).collect();
    assert_eq!(perms, vec![vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]]);
    assert_eq!(Permutations::num_permutations(&[1, 0, 1]), 3);
    assert_eq!(Permutations::num_permutations(&[3, 2, 1, 0]), 24);
    assert_eq!(Permutations::new(&[]).count(), 1);
    assert_eq!(Permutations::new(&[2, 2]).count(), 1);
}
