///
/// All `ndim`-tuples of non-negative integers whose sum is at most `budget`,
/// in lexicographic order. The single empty tuple is produced for `ndim == 0`.
///
#[derive(Clone, Debug)]
pub struct LatticePoints
{
    budget: usize,
    index_sum: usize,
    index_head: Vec<usize>,
    first: bool,
    done: bool,
}

impl LatticePoints
{
    pub fn new(ndim: usize, budget: usize) -> Self
    {
        Self { budget, index_sum: 0, index_head: vec![0; ndim], first: true, done: false }
    }

    pub fn ndim(&self) -> usize
    {
        self.index_head.len()
    }

    /// Number of points, C(budget + ndim, ndim).
    pub fn num_points(ndim: usize, budget: usize) -> usize
    {
        (1..=ndim).fold(1_usize, |acc, j| acc * (budget + j) / j)
    }
}

impl Iterator for LatticePoints
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
            self.done = self.index_head.is_empty();
            return Some(self.index_head.clone());
        }
        let ndim = self.ndim();
        if self.index_sum < self.budget
        {
            self.index_sum += 1;
            self.index_head[ndim - 1] += 1;
        }
        else
        {
            match self.index_head.iter().rposition(|&v| v > 0)
            {
                None | Some(0) =>
                {
                    self.done = true;
                    return None;
                },
                Some(dim) =>
                {
                    self.index_sum -= self.index_head[dim] - 1;
                    self.index_head[dim] = 0;
                    self.index_head[dim - 1] += 1;
                }
            }
        }
        Some(self.index_head.clone())
    }
}

#[test]
fn test_lattice_points_order()
{
    let points: Vec<_> = LatticePoints::new(2, 2).collect();
    assert_eq!(points, vec![vec![0, 0], vec![0, 1], vec![0, 2], vec![1, 0], vec![1, 1], vec![2, 0]]);
}

#[test]
fn test_lattice_points_count()
{
    for ndim in 0..5
    {
        for budget in 0..6
        {
            let points: Vec<_> = LatticePoints::new(ndim, budget).collect();
            assert_eq!(points.len(), LatticePoints::num_points(ndim, budget));
            assert!(points.iter().all(|p| p.iter().sum::<usize>() <= budget));
        }
    }
}
