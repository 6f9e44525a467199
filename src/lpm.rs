//! DIR-24-8 IPv4 longest-prefix-match routing table.
//!
//! The table is split into a dense first-level array (`tbl24`) indexed by
//! the top 24 bits of an address, and a pool of 256-entry second-level
//! groups (`tbl8`) used only for prefixes longer than /24. A single
//! 32-bit [`Entry`] packs `next_hop`, `valid`, `valid_group` and `depth`
//! so that every table update is one atomic store.
//!
//! Mutation (`add`/`delete`) requires `&mut self`: the type system enforces
//! the single-writer contract. `lookup` takes `&self` and is safe to call
//! concurrently with itself and with a single in-progress writer.

use core::sync::atomic::{fence, AtomicU32, Ordering};

use static_assertions::const_assert_eq;

use crate::error::Error;

const MAX_DEPTH_TBL24: u8 = 24;
const MAX_DEPTH: u8 = 32;
const TBL24_NUM_ENTRIES: usize = 1 << 24;
const TBL8_GROUP_NUM_ENTRIES: u32 = 256;
const MAX_TBL8_GROUPS: u32 = 1 << 24;

const NEXT_HOP_MASK: u32 = 0x00FF_FFFF;
const VALID_BIT: u32 = 1 << 24;
const VALID_GROUP_BIT: u32 = 1 << 25;
const DEPTH_SHIFT: u32 = 26;

const_assert_eq!(core::mem::size_of::<u32>(), 4);

#[inline(always)]
fn make_entry(next_hop: u32, valid: bool, valid_group: bool, depth: u8) -> u32 {
    (next_hop & NEXT_HOP_MASK)
        | if valid { VALID_BIT } else { 0 }
        | if valid_group { VALID_GROUP_BIT } else { 0 }
        | ((depth as u32) << DEPTH_SHIFT)
}

#[inline(always)]
fn entry_next_hop(e: u32) -> u32 {
    e & NEXT_HOP_MASK
}

#[inline(always)]
fn entry_valid(e: u32) -> bool {
    e & VALID_BIT != 0
}

#[inline(always)]
fn entry_valid_group(e: u32) -> bool {
    e & VALID_GROUP_BIT != 0
}

#[inline(always)]
fn entry_depth(e: u32) -> u8 {
    (e >> DEPTH_SHIFT) as u8
}

/// Construction-time parameters for a routing table.
#[derive(Debug, Clone, Copy)]
pub struct LpmConfig {
    /// Maximum number of distinct (prefix, depth) rules the table can hold.
    pub max_rules: u32,
    /// Number of tbl8 groups reserved for prefixes longer than /24.
    pub number_tbl8s: u32,
}

/// Per-depth rule-table occupancy, as returned by [`Lpm::dump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthInfo {
    pub depth: u8,
    pub first_rule: u32,
    pub used_rules: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Rule {
    ip: u32,
    next_hop: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct RuleInfo {
    first_rule: u32,
    used_rules: u32,
}

enum RuleAdd {
    Existed,
    Inserted(u32),
    NoSpace,
}

enum Recycle {
    Empty,
    /// Group collapsed to a single shallow prefix; index of the
    /// representative entry to copy depth/next_hop from (always the
    /// group's first entry).
    Collapse(u32),
    InUse,
}

/// An IPv4 longest-prefix-match routing table.
pub struct Lpm {
    name: String,
    tbl24: Vec<AtomicU32>,
    tbl8: Vec<AtomicU32>,
    rules: Vec<Rule>,
    rule_info: [RuleInfo; MAX_DEPTH as usize],
    max_rules: u32,
    number_tbl8s: u32,
}

impl Lpm {
    /// Allocates a new, empty table.
    pub fn create(name: &str, config: LpmConfig) -> Result<Self, Error> {
        if config.max_rules == 0 || config.number_tbl8s > MAX_TBL8_GROUPS {
            return Err(Error::InvalidArgument);
        }
        let tbl24 = (0..TBL24_NUM_ENTRIES).map(|_| AtomicU32::new(0)).collect();
        let tbl8_len = config.number_tbl8s as usize * TBL8_GROUP_NUM_ENTRIES as usize;
        let tbl8 = (0..tbl8_len).map(|_| AtomicU32::new(0)).collect();
        let rules = vec![Rule::default(); config.max_rules as usize];
        Ok(Lpm {
            name: name.to_string(),
            tbl24,
            tbl8,
            rules,
            rule_info: [RuleInfo::default(); MAX_DEPTH as usize],
            max_rules: config.max_rules,
            number_tbl8s: config.number_tbl8s,
        })
    }

    fn depth_to_mask(depth: u8) -> u32 {
        debug_assert!((1..=MAX_DEPTH).contains(&depth));
        (!0u32) << (32 - depth as u32)
    }

    fn depth_to_range(depth: u8) -> u32 {
        debug_assert!((1..=MAX_DEPTH).contains(&depth));
        if depth <= MAX_DEPTH_TBL24 {
            1 << (MAX_DEPTH_TBL24 - depth)
        } else {
            1 << (MAX_DEPTH - depth)
        }
    }

    /// Inserts or updates a rule. Re-adding an identical (ip, depth,
    /// next_hop) triple is a no-op; re-adding with a different next_hop
    /// updates the mapping. Both are reported as `Ok(())`.
    pub fn add(&mut self, ip: u32, depth: u8, next_hop: u32) -> Result<(), Error> {
        if !(1..=MAX_DEPTH).contains(&depth) {
            return Err(Error::InvalidArgument);
        }
        let ip_masked = ip & Self::depth_to_mask(depth);
        let next_hop = next_hop & NEXT_HOP_MASK;

        let rule_index = match self.rule_add(ip_masked, depth, next_hop) {
            RuleAdd::Existed => return Ok(()),
            RuleAdd::NoSpace => {
                log::warn!("lpm@{}: rule table exhausted at depth {}", self.name, depth);
                return Err(Error::NoSpace);
            }
            RuleAdd::Inserted(idx) => idx,
        };

        if depth <= MAX_DEPTH_TBL24 {
            self.add_depth_small(ip_masked, depth, next_hop);
            Ok(())
        } else if let Err(e) = self.add_depth_big(ip_masked, depth, next_hop) {
            // Roll back the rule-table insertion so external state stays atomic.
            self.rule_delete(rule_index, depth);
            log::warn!("lpm@{}: tbl8 pool exhausted at depth {}", self.name, depth);
            Err(e)
        } else {
            Ok(())
        }
    }

    /// Removes a rule. Affected lookup entries fall back to the deepest
    /// remaining covering prefix, or become misses if none exists.
    pub fn delete(&mut self, ip: u32, depth: u8) -> Result<(), Error> {
        if !(1..=MAX_DEPTH).contains(&depth) {
            return Err(Error::InvalidArgument);
        }
        let ip_masked = ip & Self::depth_to_mask(depth);
        let rule_index = self.rule_find(ip_masked, depth).ok_or_else(|| {
            log::debug!("lpm@{}: delete of absent rule at depth {}", self.name, depth);
            Error::NotFound
        })?;
        self.rule_delete(rule_index, depth);

        let sub_rule = self.find_previous_rule(ip, depth);
        if depth <= MAX_DEPTH_TBL24 {
            self.delete_depth_small(ip_masked, depth, sub_rule);
        } else {
            self.delete_depth_big(ip_masked, depth, sub_rule);
        }
        Ok(())
    }

    /// Wait-free lookup of the most specific rule covering `ip`.
    pub fn lookup(&self, ip: u32) -> Result<u32, Error> {
        let tbl24_index = (ip >> 8) as usize;
        let mut entry = self.tbl24[tbl24_index].load(Ordering::Acquire);
        if entry_valid(entry) && entry_valid_group(entry) {
            let tbl8_index =
                (ip & 0xFF) + entry_next_hop(entry) * TBL8_GROUP_NUM_ENTRIES;
            entry = self.tbl8[tbl8_index as usize].load(Ordering::Acquire);
        }
        if entry_valid(entry) {
            Ok(entry_next_hop(entry))
        } else {
            Err(Error::NotFound)
        }
    }

    /// Returns per-depth rule-table occupancy.
    pub fn dump(&self) -> Vec<DepthInfo> {
        log::debug!("lpm@{}: dump", self.name);
        (1u8..=MAX_DEPTH)
            .map(|depth| {
                let info = self.rule_info[(depth - 1) as usize];
                DepthInfo {
                    depth,
                    first_rule: info.first_rule,
                    used_rules: info.used_rules,
                }
            })
            .collect()
    }

    // ---- rule table -----------------------------------------------------

    fn rule_add(&mut self, ip_masked: u32, depth: u8, next_hop: u32) -> RuleAdd {
        let d = (depth - 1) as usize;
        let rule_index;

        if self.rule_info[d].used_rules > 0 {
            let gindex = self.rule_info[d].first_rule;
            let last = gindex + self.rule_info[d].used_rules;
            for ri in gindex..last {
                if self.rules[ri as usize].ip == ip_masked {
                    if self.rules[ri as usize].next_hop == next_hop {
                        return RuleAdd::Existed;
                    }
                    self.rules[ri as usize].next_hop = next_hop;
                    return RuleAdd::Inserted(ri);
                }
            }
            if last == self.max_rules {
                return RuleAdd::NoSpace;
            }
            rule_index = last;
        } else {
            let mut idx = 0u32;
            for i in (1..depth).rev() {
                let gi = (i - 1) as usize;
                if self.rule_info[gi].used_rules > 0 {
                    idx = self.rule_info[gi].first_rule + self.rule_info[gi].used_rules;
                    break;
                }
            }
            if idx == self.max_rules {
                return RuleAdd::NoSpace;
            }
            rule_index = idx;
            self.rule_info[d].first_rule = rule_index;
        }

        // Make room by shifting every deeper group's first element to the
        // end of its range, propagating the gap up to `rule_index`.
        for i in (depth + 1..=MAX_DEPTH).rev() {
            let gi = (i - 1) as usize;
            if self.rule_info[gi].first_rule + self.rule_info[gi].used_rules == self.max_rules {
                return RuleAdd::NoSpace;
            }
            if self.rule_info[gi].used_rules > 0 {
                let src = self.rule_info[gi].first_rule;
                let dst = src + self.rule_info[gi].used_rules;
                self.rules[dst as usize] = self.rules[src as usize];
                self.rule_info[gi].first_rule += 1;
            }
        }

        self.rules[rule_index as usize] = Rule {
            ip: ip_masked,
            next_hop,
        };
        self.rule_info[d].used_rules += 1;
        RuleAdd::Inserted(rule_index)
    }

    fn rule_delete(&mut self, rule_index: u32, depth: u8) {
        let d = (depth - 1) as usize;
        let last = self.rule_info[d].first_rule + self.rule_info[d].used_rules - 1;
        self.rules[rule_index as usize] = self.rules[last as usize];

        for i in depth..MAX_DEPTH {
            let gi = i as usize;
            if self.rule_info[gi].used_rules > 0 {
                let first = self.rule_info[gi].first_rule;
                let last = first + self.rule_info[gi].used_rules - 1;
                self.rules[(first - 1) as usize] = self.rules[last as usize];
                self.rule_info[gi].first_rule -= 1;
            }
        }
        self.rule_info[d].used_rules -= 1;
    }

    fn rule_find(&self, ip_masked: u32, depth: u8) -> Option<u32> {
        let d = (depth - 1) as usize;
        let first = self.rule_info[d].first_rule;
        let last = first + self.rule_info[d].used_rules;
        (first..last).find(|&ri| self.rules[ri as usize].ip == ip_masked)
    }

    fn find_previous_rule(&self, ip: u32, depth: u8) -> Option<(u32, u8)> {
        for prev_depth in (1..depth).rev() {
            let ip_masked = ip & Self::depth_to_mask(prev_depth);
            if let Some(idx) = self.rule_find(ip_masked, prev_depth) {
                return Some((idx, prev_depth));
            }
        }
        None
    }

    // ---- tbl24 / tbl8 mutation -------------------------------------------

    fn add_depth_small(&mut self, ip_masked: u32, depth: u8, next_hop: u32) {
        let tbl24_index = ip_masked >> 8;
        let range = Self::depth_to_range(depth);

        for i in tbl24_index..tbl24_index + range {
            let cur = self.tbl24[i as usize].load(Ordering::Relaxed);
            if !entry_valid(cur) || (!entry_valid_group(cur) && entry_depth(cur) <= depth) {
                self.tbl24[i as usize]
                    .store(make_entry(next_hop, true, false, depth), Ordering::Release);
                continue;
            }
            if entry_valid_group(cur) {
                let start = entry_next_hop(cur) * TBL8_GROUP_NUM_ENTRIES;
                for j in start..start + TBL8_GROUP_NUM_ENTRIES {
                    let cur8 = self.tbl8[j as usize].load(Ordering::Relaxed);
                    if !entry_valid(cur8) || entry_depth(cur8) <= depth {
                        self.tbl8[j as usize]
                            .store(make_entry(next_hop, true, true, depth), Ordering::Relaxed);
                    }
                }
            }
        }
    }

    fn add_depth_big(&mut self, ip_masked: u32, depth: u8, next_hop: u32) -> Result<(), Error> {
        let tbl24_index = ip_masked >> 8;
        let range = Self::depth_to_range(depth);
        let cur24 = self.tbl24[tbl24_index as usize].load(Ordering::Relaxed);

        if !entry_valid(cur24) {
            let group_idx = self.tbl8_alloc().ok_or(Error::NoSpace)?;
            let tbl8_index = group_idx * TBL8_GROUP_NUM_ENTRIES + (ip_masked & 0xFF);
            for i in tbl8_index..tbl8_index + range {
                self.tbl8_store_preserve_group(i, next_hop, true, depth);
            }
            // The tbl24 entry must publish only after every tbl8 write above
            // is visible, so lockless readers never see a half-built group.
            self.tbl24[tbl24_index as usize]
                .store(make_entry(group_idx, true, true, 0), Ordering::Release);
        } else if !entry_valid_group(cur24) {
            let group_idx = self.tbl8_alloc().ok_or(Error::NoSpace)?;
            let start = group_idx * TBL8_GROUP_NUM_ENTRIES;
            let end = start + TBL8_GROUP_NUM_ENTRIES;
            let (existing_depth, existing_next_hop) = (entry_depth(cur24), entry_next_hop(cur24));
            for i in start..end {
                self.tbl8_store_preserve_group(i, existing_next_hop, true, existing_depth);
            }
            let tbl8_index = start + (ip_masked & 0xFF);
            for i in tbl8_index..tbl8_index + range {
                self.tbl8_store_preserve_group(i, next_hop, true, depth);
            }
            self.tbl24[tbl24_index as usize]
                .store(make_entry(group_idx, true, true, 0), Ordering::Release);
        } else {
            let start = entry_next_hop(cur24) * TBL8_GROUP_NUM_ENTRIES;
            let tbl8_index = start + (ip_masked & 0xFF);
            for i in tbl8_index..tbl8_index + range {
                let cur8 = self.tbl8[i as usize].load(Ordering::Relaxed);
                if !entry_valid(cur8) || entry_depth(cur8) <= depth {
                    self.tbl8_store_preserve_group(i, next_hop, true, depth);
                }
            }
        }
        Ok(())
    }

    fn delete_depth_small(&mut self, ip_masked: u32, depth: u8, sub_rule: Option<(u32, u8)>) {
        let tbl24_index = ip_masked >> 8;
        let range = Self::depth_to_range(depth);

        match sub_rule {
            None => {
                for i in tbl24_index..tbl24_index + range {
                    let cur = self.tbl24[i as usize].load(Ordering::Relaxed);
                    if !entry_valid_group(cur) && entry_depth(cur) <= depth {
                        self.tbl24[i as usize].store(0, Ordering::Release);
                    } else if entry_valid_group(cur) {
                        self.clear_covered_tbl8_group(entry_next_hop(cur), depth);
                    }
                }
            }
            Some((sub_idx, sub_depth)) => {
                let next_hop = self.rules[sub_idx as usize].next_hop;
                for i in tbl24_index..tbl24_index + range {
                    let cur = self.tbl24[i as usize].load(Ordering::Relaxed);
                    if !entry_valid_group(cur) && entry_depth(cur) <= depth {
                        self.tbl24[i as usize].store(
                            make_entry(next_hop, true, false, sub_depth),
                            Ordering::Release,
                        );
                    } else if entry_valid_group(cur) {
                        self.replace_covered_tbl8_group(
                            entry_next_hop(cur),
                            depth,
                            next_hop,
                            sub_depth,
                        );
                    }
                }
            }
        }
    }

    fn delete_depth_big(&mut self, ip_masked: u32, depth: u8, sub_rule: Option<(u32, u8)>) {
        let tbl24_index = ip_masked >> 8;
        let cur24 = self.tbl24[tbl24_index as usize].load(Ordering::Relaxed);
        let group_idx = entry_next_hop(cur24);
        let start = group_idx * TBL8_GROUP_NUM_ENTRIES;
        let tbl8_index = start + (ip_masked & 0xFF);
        let range = Self::depth_to_range(depth);

        match sub_rule {
            None => {
                for i in tbl8_index..tbl8_index + range {
                    let cur = self.tbl8[i as usize].load(Ordering::Relaxed);
                    if entry_depth(cur) <= depth {
                        let vg = entry_valid_group(cur);
                        self.tbl8[i as usize].store(
                            make_entry(entry_next_hop(cur), false, vg, entry_depth(cur)),
                            Ordering::Relaxed,
                        );
                    }
                }
            }
            Some((sub_idx, sub_depth)) => {
                let next_hop = self.rules[sub_idx as usize].next_hop;
                for i in tbl8_index..tbl8_index + range {
                    let cur = self.tbl8[i as usize].load(Ordering::Relaxed);
                    if entry_depth(cur) <= depth {
                        self.tbl8_store_preserve_group(i, next_hop, true, sub_depth);
                    }
                }
            }
        }

        match self.tbl8_recycle_check(start) {
            Recycle::InUse => {}
            Recycle::Empty => {
                let cur = self.tbl24[tbl24_index as usize].load(Ordering::Relaxed);
                self.tbl24[tbl24_index as usize].store(cur & !VALID_BIT, Ordering::Relaxed);
                fence(Ordering::Release);
                self.tbl8_free(start);
            }
            Recycle::Collapse(idx) => {
                let e = self.tbl8[idx as usize].load(Ordering::Relaxed);
                self.tbl24[tbl24_index as usize].store(
                    make_entry(entry_next_hop(e), true, false, entry_depth(e)),
                    Ordering::Relaxed,
                );
                fence(Ordering::Release);
                self.tbl8_free(start);
            }
        }
    }

    fn clear_covered_tbl8_group(&mut self, group_idx: u32, depth: u8) {
        let start = group_idx * TBL8_GROUP_NUM_ENTRIES;
        for j in start..start + TBL8_GROUP_NUM_ENTRIES {
            let cur = self.tbl8[j as usize].load(Ordering::Relaxed);
            if entry_depth(cur) <= depth {
                let vg = entry_valid_group(cur);
                self.tbl8[j as usize].store(
                    make_entry(entry_next_hop(cur), false, vg, entry_depth(cur)),
                    Ordering::Relaxed,
                );
            }
        }
    }

    fn replace_covered_tbl8_group(&mut self, group_idx: u32, depth: u8, next_hop: u32, sub_depth: u8) {
        let start = group_idx * TBL8_GROUP_NUM_ENTRIES;
        for j in start..start + TBL8_GROUP_NUM_ENTRIES {
            let cur = self.tbl8[j as usize].load(Ordering::Relaxed);
            if entry_depth(cur) <= depth {
                self.tbl8[j as usize]
                    .store(make_entry(next_hop, true, true, sub_depth), Ordering::Relaxed);
            }
        }
    }

    // ---- tbl8 pool --------------------------------------------------------

    fn tbl8_alloc(&mut self) -> Option<u32> {
        for group_idx in 0..self.number_tbl8s {
            let base = (group_idx * TBL8_GROUP_NUM_ENTRIES) as usize;
            let first = self.tbl8[base].load(Ordering::Relaxed);
            if !entry_valid_group(first) {
                for k in 0..TBL8_GROUP_NUM_ENTRIES as usize {
                    self.tbl8[base + k].store(0, Ordering::Relaxed);
                }
                self.tbl8[base].store(make_entry(0, false, true, 0), Ordering::Relaxed);
                return Some(group_idx);
            }
        }
        None
    }

    /// Marks a tbl8 group free so the allocator scan above can reuse it.
    ///
    /// The original C implementation left this as a no-op (the body of
    /// `tbl8_free` is commented out), which leaks every recycled group.
    /// That is a bug in the source being fixed here, not behavior being
    /// preserved.
    fn tbl8_free(&mut self, start: u32) {
        self.tbl8[start as usize].store(make_entry(0, false, false, 0), Ordering::Relaxed);
        log::debug!(
            "lpm@{}: freed tbl8 group {}",
            self.name,
            start / TBL8_GROUP_NUM_ENTRIES
        );
    }

    fn tbl8_recycle_check(&self, start: u32) -> Recycle {
        let end = start + TBL8_GROUP_NUM_ENTRIES;
        let first = self.tbl8[start as usize].load(Ordering::Relaxed);

        if entry_valid(first) {
            if entry_depth(first) <= MAX_DEPTH_TBL24 {
                for i in (start + 1)..end {
                    let e = self.tbl8[i as usize].load(Ordering::Relaxed);
                    if entry_depth(e) != entry_depth(first) {
                        return Recycle::InUse;
                    }
                }
                return Recycle::Collapse(start);
            }
            return Recycle::InUse;
        }
        for i in (start + 1)..end {
            if entry_valid(self.tbl8[i as usize].load(Ordering::Relaxed)) {
                return Recycle::InUse;
            }
        }
        Recycle::Empty
    }

    fn tbl8_store_preserve_group(&self, idx: u32, next_hop: u32, valid: bool, depth: u8) {
        let cur = self.tbl8[idx as usize].load(Ordering::Relaxed);
        let vg = entry_valid_group(cur);
        self.tbl8[idx as usize].store(make_entry(next_hop, valid, vg, depth), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> u32 {
        ((a as u32) << 24) | ((b as u32) << 16) | ((c as u32) << 8) | d as u32
    }

    #[test]
    fn test_lpm_creation() {
        let lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 200,
                number_tbl8s: 10,
            },
        );
        assert!(lpm.is_ok());
    }

    #[test]
    fn test_lpm_create_rejects_zero_max_rules() {
        let lpm = Lpm::create(
            "bad",
            LpmConfig {
                max_rules: 0,
                number_tbl8s: 10,
            },
        );
        assert_eq!(lpm.err(), Some(Error::InvalidArgument));
    }

    #[test]
    fn test_most_specific_wins_and_delete_reinstates() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 200,
                number_tbl8s: 10,
            },
        )
        .unwrap();

        lpm.add(ip(192, 168, 3, 0), 24, 66).unwrap();
        lpm.add(ip(192, 168, 3, 44), 32, 3).unwrap();

        assert_eq!(lpm.lookup(ip(192, 168, 3, 45)), Ok(66));
        assert_eq!(lpm.lookup(ip(192, 168, 3, 44)), Ok(3));

        lpm.delete(ip(192, 168, 3, 44), 32).unwrap();
        assert_eq!(lpm.lookup(ip(192, 168, 3, 44)), Ok(66));
    }

    #[test]
    fn test_default_route_and_miss() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 16,
                number_tbl8s: 4,
            },
        )
        .unwrap();

        lpm.add(0, 1, 1).unwrap();
        assert_eq!(lpm.lookup(0), Ok(1));
        assert_eq!(lpm.lookup(ip(128, 0, 0, 0)), Err(Error::NotFound));
    }

    #[test]
    fn test_add_idempotent_and_update() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 16,
                number_tbl8s: 4,
            },
        )
        .unwrap();

        lpm.add(ip(10, 0, 0, 0), 24, 7).unwrap();
        lpm.add(ip(10, 0, 0, 0), 24, 7).unwrap();
        assert_eq!(lpm.lookup(ip(10, 0, 0, 5)), Ok(7));

        lpm.add(ip(10, 0, 0, 0), 24, 9).unwrap();
        assert_eq!(lpm.lookup(ip(10, 0, 0, 5)), Ok(9));
    }

    #[test]
    fn test_tbl8_exhaustion_rolls_back() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 16,
                number_tbl8s: 1,
            },
        )
        .unwrap();

        lpm.add(ip(10, 0, 0, 1), 32, 1).unwrap();
        let err = lpm.add(ip(20, 0, 0, 1), 32, 2);
        assert_eq!(err, Err(Error::NoSpace));
        assert_eq!(lpm.lookup(ip(10, 0, 0, 1)), Ok(1));
        assert_eq!(lpm.lookup(ip(20, 0, 0, 1)), Err(Error::NotFound));
    }

    #[test]
    fn test_delete_reuses_freed_tbl8_group() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 16,
                number_tbl8s: 1,
            },
        )
        .unwrap();

        lpm.add(ip(10, 0, 0, 1), 32, 1).unwrap();
        lpm.delete(ip(10, 0, 0, 1), 32).unwrap();
        // The sole tbl8 group must have been recycled; a second /32 under a
        // different /24 should now succeed instead of returning NoSpace.
        assert_eq!(lpm.add(ip(20, 0, 0, 1), 32, 2), Ok(()));
        assert_eq!(lpm.lookup(ip(20, 0, 0, 1)), Ok(2));
    }

    #[test]
    fn test_delete_not_found() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 16,
                number_tbl8s: 1,
            },
        )
        .unwrap();
        assert_eq!(lpm.delete(ip(1, 2, 3, 4), 24), Err(Error::NotFound));
    }

    #[test]
    fn test_dump_reports_used_rules() {
        let mut lpm = Lpm::create(
            "test",
            LpmConfig {
                max_rules: 16,
                number_tbl8s: 1,
            },
        )
        .unwrap();
        lpm.add(ip(10, 0, 0, 0), 24, 1).unwrap();
        lpm.add(ip(10, 0, 1, 0), 24, 2).unwrap();

        let info = lpm.dump();
        assert_eq!(info[23].depth, 24);
        assert_eq!(info[23].used_rules, 2);
    }
}
