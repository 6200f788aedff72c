use serde::{Deserialize, Serialize};

/// A 5-dimensional rectangle used both as a stored exclusion interval and as
/// the shape of an interval-overlap / remove query.
///
/// Every bound is `Option<f64>` (or `Option<i32>` for charge): `None` means
/// "no bound on this side" — read as `-infinity` for a minimum and
/// `+infinity` for a maximum. `interval_id` may be `None` for query-shaped
/// intervals but must be `Some` for anything passed to
/// [`ExclusionStore::add`](crate::store::ExclusionStore::add).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionInterval {
    pub interval_id: Option<String>,
    pub charge: Option<i32>,
    pub min_mass: Option<f64>,
    pub max_mass: Option<f64>,
    pub min_rt: Option<f64>,
    pub max_rt: Option<f64>,
    pub min_ook0: Option<f64>,
    pub max_ook0: Option<f64>,
    pub min_intensity: Option<f64>,
    pub max_intensity: Option<f64>,
}

impl ExclusionInterval {
    /// An interval is valid iff every present `(min, max)` pair has
    /// `min <= max`. `interval_id` presence is not checked here — `add`
    /// enforces that separately, since query-shaped intervals are allowed a
    /// null id.
    pub fn is_valid(&self) -> bool {
        pair_is_valid(self.min_mass, self.max_mass)
            && pair_is_valid(self.min_rt, self.max_rt)
            && pair_is_valid(self.min_ook0, self.max_ook0)
            && pair_is_valid(self.min_intensity, self.max_intensity)
    }

    /// Does this interval contain `point` under the null-as-wildcard rule of
    /// the data model? Charge is special-cased: null on either side
    /// matches.
    pub fn contains_point(&self, point: &ExclusionPoint) -> bool {
        charge_wildcard_match(self.charge, point.charge)
            && dim_contains_value(self.min_mass, self.max_mass, point.mass)
            && dim_contains_value(self.min_rt, self.max_rt, point.rt)
            && dim_contains_value(self.min_ook0, self.max_ook0, point.ook0)
            && dim_contains_value(self.min_intensity, self.max_intensity, point.intensity)
    }

    /// Do `self` and `other` overlap as intervals (used by
    /// `query_by_interval`)? Every dimension's projected ranges must
    /// overlap; charges must be equal or at least one null.
    pub fn overlaps(&self, other: &ExclusionInterval) -> bool {
        charge_wildcard_match(self.charge, other.charge)
            && ranges_overlap(self.min_mass, self.max_mass, other.min_mass, other.max_mass)
            && ranges_overlap(self.min_rt, self.max_rt, other.min_rt, other.max_rt)
            && ranges_overlap(
                self.min_ook0,
                self.max_ook0,
                other.min_ook0,
                other.max_ook0,
            )
            && ranges_overlap(
                self.min_intensity,
                self.max_intensity,
                other.min_intensity,
                other.max_intensity,
            )
    }

    /// Does `self` (read as a query `Q`) contain `candidate` (read as a
    /// stored interval `I`), in the sense `remove` uses to match candidates?
    ///
    /// This is a stricter, containment-flavored relation than [`overlaps`](
    /// Self::overlaps): a non-null bound on `self` requires `candidate` to
    /// have a *present* bound on that side that falls within it (an
    /// unbounded candidate side is not "contained" by a bounded query side).
    /// A non-null query charge only matches a candidate with an equal,
    /// non-null charge — a wildcard stored charge does not satisfy a
    /// specific query charge here.
    pub fn query_contains(&self, candidate: &ExclusionInterval) -> bool {
        id_matches(&self.interval_id, &candidate.interval_id)
            && charge_query_match(self.charge, candidate.charge)
            && dim_contained(self.min_mass, self.max_mass, candidate.min_mass, candidate.max_mass)
            && dim_contained(self.min_rt, self.max_rt, candidate.min_rt, candidate.max_rt)
            && dim_contained(
                self.min_ook0,
                self.max_ook0,
                candidate.min_ook0,
                candidate.max_ook0,
            )
            && dim_contained(
                self.min_intensity,
                self.max_intensity,
                candidate.min_intensity,
                candidate.max_intensity,
            )
    }

    /// True iff `self.interval_id` is non-null and every numeric bound is
    /// null — the "delete every interval with this id" shorthand the id map
    /// short-circuits on.
    pub fn is_id_only_query(&self) -> bool {
        self.interval_id.is_some()
            && self.min_mass.is_none()
            && self.max_mass.is_none()
            && self.min_rt.is_none()
            && self.max_rt.is_none()
            && self.min_ook0.is_none()
            && self.max_ook0.is_none()
            && self.min_intensity.is_none()
            && self.max_intensity.is_none()
    }
}

/// A candidate precursor ion to test against the store. Any field may be
/// null; null is the wildcard sentinel described in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExclusionPoint {
    pub charge: Option<i32>,
    pub mass: Option<f64>,
    pub rt: Option<f64>,
    pub ook0: Option<f64>,
    pub intensity: Option<f64>,
}

fn pair_is_valid(min: Option<f64>, max: Option<f64>) -> bool {
    match (min, max) {
        (Some(lo), Some(hi)) => lo <= hi,
        _ => true,
    }
}

/// Charge containment for point queries and interval overlap: null on
/// either side matches, otherwise equality is required.
fn charge_wildcard_match(a: Option<i32>, b: Option<i32>) -> bool {
    match (a, b) {
        (None, _) | (_, None) => true,
        (Some(x), Some(y)) => x == y,
    }
}

/// Charge matching for `remove`'s containment test: a non-null query charge
/// only matches a candidate with an equal, non-null charge.
fn charge_query_match(query: Option<i32>, candidate: Option<i32>) -> bool {
    match query {
        None => true,
        Some(q) => candidate == Some(q),
    }
}

fn id_matches(query_id: &Option<String>, candidate_id: &Option<String>) -> bool {
    match query_id {
        None => true,
        Some(q) => candidate_id.as_deref() == Some(q.as_str()),
    }
}

/// Is `value` contained in `[min, max]`, with `None` bounds open and a
/// `None` value a wildcard that matches anything?
fn dim_contains_value(min: Option<f64>, max: Option<f64>, value: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(v) = value else {
        return true;
    };
    min.is_none_or(|lo| v >= lo) && max.is_none_or(|hi| v <= hi)
}

/// Do ranges `[a_min, a_max]` and `[b_min, b_max]` overlap, with `None`
/// bounds extending to +-infinity?
fn ranges_overlap(
    a_min: Option<f64>,
    a_max: Option<f64>,
    b_min: Option<f64>,
    b_max: Option<f64>,
) -> bool {
    let lower_ok = match (a_min, b_max) {
        (Some(lo), Some(hi)) => lo <= hi,
        _ => true,
    };
    let upper_ok = match (b_min, a_max) {
        (Some(lo), Some(hi)) => lo <= hi,
        _ => true,
    };
    lower_ok && upper_ok
}

/// Is candidate range `[c_min, c_max]` contained within query range
/// `[q_min, q_max]`? A null query bound is unbounded (always satisfied); a
/// null candidate bound on a side the query bounds is never contained,
/// since an unbounded candidate side can't fit inside a bounded query side.
fn dim_contained(
    q_min: Option<f64>,
    q_max: Option<f64>,
    c_min: Option<f64>,
    c_max: Option<f64>,
) -> bool {
    let lower_ok = match q_min {
        None => true,
        Some(q) => c_min.is_some_and(|c| c >= q),
    };
    let upper_ok = match q_max {
        None => true,
        Some(q) => c_max.is_some_and(|c| c <= q),
    };
    lower_ok && upper_ok
}
