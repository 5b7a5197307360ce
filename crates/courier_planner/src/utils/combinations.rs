/// Number of size-`k` combinations of `n` elements, saturating on overflow.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }

    let k = k.min(n - k);
    let mut result: usize = 1;
    for i in 0..k {
        result = match result.checked_mul(n - i) {
            Some(value) => value / (i + 1),
            None => return usize::MAX,
        };
    }

    result
}

/// Lazily yields every size-`k` combination of the indices `0..n` in lexicographic order.
///
/// Cloning the iterator before it is consumed restarts the enumeration.
#[derive(Clone, Debug)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }

    fn advance(&mut self) -> bool {
        let k = self.indices.len();
        let mut i = k;

        loop {
            if i == 0 {
                return false;
            }
            i -= 1;

            if self.indices[i] != i + self.n - k {
                break;
            }
        }

        self.indices[i] += 1;
        for j in (i + 1)..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }

        true
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
        } else if !self.advance() {
            self.done = true;
            return None;
        }

        Some(self.indices.clone())
    }
}

/// Rearranges `values` into the next lexicographic permutation. Returns false,
/// leaving `values` sorted ascending, once the last permutation was reached.
pub fn next_permutation(values: &mut [usize]) -> bool {
    if values.len() < 2 {
        return false;
    }

    let mut i = values.len() - 1;
    while i > 0 && values[i - 1] >= values[i] {
        i -= 1;
    }

    if i == 0 {
        values.reverse();
        return false;
    }

    let mut j = values.len() - 1;
    while values[j] <= values[i - 1] {
        j -= 1;
    }

    values.swap(i - 1, j);
    values[i..].reverse();

    true
}

/// Yields the visiting orders a cluster search evaluates: every combination as is,
/// or, when `permute` is set, every permutation of every combination.
#[derive(Clone, Debug)]
pub struct ClusterOrderings {
    combinations: Combinations,
    current: Option<Vec<usize>>,
    permute: bool,
}

impl ClusterOrderings {
    pub fn new(n: usize, k: usize, permute: bool) -> Self {
        Self {
            combinations: Combinations::new(n, k),
            current: None,
            permute,
        }
    }
}

impl Iterator for ClusterOrderings {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.permute {
            return self.combinations.next();
        }

        if let Some(current) = self.current.as_mut() {
            if next_permutation(current) {
                return Some(current.clone());
            }
        }

        let combination = self.combinations.next()?;
        self.current = Some(combination.clone());
        Some(combination)
    }
}
