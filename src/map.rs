//! RAID-Z map construction
//!
//! A map describes how one logical I/O is spread over the children of a
//! RAID-Z group: which child receives each column, at which byte offset, and
//! which part of the caller's buffer backs it. Parity columns own their
//! buffers; data columns are views into the borrowed I/O buffer.
//!
//! ## Layouts
//!
//! - [`RaidzMap::build`] produces the multi-row layout that tolerates a group
//!   being widened by one child while a reflow is in progress. Every row is
//!   one sector tall and data is interleaved so that short final rows still
//!   look full-width to the parity math.
//! - [`RaidzMap::build_single_row`] produces the classic single-row layout
//!   where each column holds a contiguous run of sectors.
//!
//! Both layouts implement the single-parity "swap every 1 MiB" rule, which
//! is part of the on-disk format.

use crate::abd::Abd;
use crate::error::{RaidzError, Result};
use log::{debug, trace};

/// Largest parity count supported by RAID-Z
pub const RAIDZ_MAXPARITY: usize = 3;

/// Logical offset bit that triggers the single-parity column swap
const PARITY_SWAP_BIT: u64 = 1 << 20;

/// Backing storage of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnData {
    /// Byte range inside the caller's I/O buffer
    View { offset: usize, len: usize },
    /// Buffer owned by the map (parity and scratch)
    Owned(Abd),
    /// Zero-size phantom column of a short row
    Empty,
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::View { len, .. } => *len,
            ColumnData::Owned(abd) => abd.len(),
            ColumnData::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a column's contents cannot be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnError {
    /// The child returned an I/O error
    Io,
    /// Contents did not match regenerated parity or the block checksum
    Checksum,
}

/// One child's contribution to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidzCol {
    /// Child index within the group
    pub devidx: usize,
    /// Byte offset on the child
    pub offset: u64,
    /// Column size in bytes
    pub size: usize,
    pub data: ColumnData,
    pub error: Option<ColumnError>,
    /// A read was issued for this column
    pub tried: bool,
    /// The column was deliberately not read
    pub skipped: bool,
}

impl RaidzCol {
    fn new(devidx: usize, offset: u64) -> Self {
        Self {
            devidx,
            offset,
            size: 0,
            data: ColumnData::Empty,
            error: None,
            tried: false,
            skipped: false,
        }
    }
}

/// One stripe of a map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidzRow {
    /// Columns taking part in parity math
    pub cols: usize,
    /// Columns including skip padding (equals `cols` for multi-row maps)
    pub scols: usize,
    /// Index of the first data column, equal to the parity count
    pub firstdatacol: usize,
    /// Columns holding remainder data in a short row
    pub bigcols: usize,
    /// Padding sectors needed to round the allocation (single-row maps)
    pub nskip: usize,
    /// First column that receives a padding sector (single-row maps)
    pub skipstart: usize,
    pub missing_data: usize,
    pub missing_parity: usize,
    pub columns: Vec<RaidzCol>,
    /// Copy of the data columns taken by [`RaidzMap::detach_copy`]
    pub orig_copy: Option<Abd>,
}

impl RaidzRow {
    pub fn nparity(&self) -> usize {
        self.firstdatacol
    }

    /// Size of the parity columns, which bounds every data column
    pub fn parity_size(&self) -> usize {
        self.columns.first().map_or(0, |c| c.size)
    }

    /// Columns used by parity math
    pub fn active_columns(&self) -> &[RaidzCol] {
        &self.columns[..self.cols]
    }

    /// Original contents of data column `c` as captured by `detach_copy`
    pub fn original_column(&self, c: usize) -> Option<&[u8]> {
        let copy = self.orig_copy.as_ref()?;
        if c < self.firstdatacol || c >= self.cols {
            return None;
        }
        let start: usize = self.columns[self.firstdatacol..c]
            .iter()
            .map(|col| col.size)
            .sum();
        Some(copy.view(start, self.columns[c].size))
    }

    /// Recount missing columns from the per-column error flags
    pub fn count_missing(&mut self) {
        let firstdatacol = self.firstdatacol;
        let (parity, data) = self.columns[..self.cols].split_at(firstdatacol);
        self.missing_parity = parity.iter().filter(|c| c.error.is_some()).count();
        self.missing_data = data.iter().filter(|c| c.error.is_some()).count();
    }

    fn alloc(ncols: usize, nparity: usize) -> Self {
        Self {
            cols: ncols,
            scols: ncols,
            firstdatacol: nparity,
            bigcols: 0,
            nskip: 0,
            skipstart: 0,
            missing_data: 0,
            missing_parity: 0,
            columns: Vec::with_capacity(ncols),
            orig_copy: None,
        }
    }

    fn swap_parity_with_first_data(&mut self) {
        let (first, rest) = self.columns.split_at_mut(1);
        std::mem::swap(&mut first[0].devidx, &mut rest[0].devidx);
        std::mem::swap(&mut first[0].offset, &mut rest[0].offset);
    }
}

/// Bytes of `col` given the I/O buffer it may view into
pub fn column_slice<'b>(io: &'b [u8], col: &'b RaidzCol) -> &'b [u8] {
    match &col.data {
        ColumnData::View { offset, len } => &io[*offset..*offset + *len],
        ColumnData::Owned(abd) => abd.as_slice(),
        ColumnData::Empty => &[],
    }
}

/// Mutable bytes of `col` given the I/O buffer it may view into
pub fn column_slice_mut<'b>(io: &'b mut [u8], col: &'b mut RaidzCol) -> &'b mut [u8] {
    match &mut col.data {
        ColumnData::View { offset, len } => &mut io[*offset..*offset + *len],
        ColumnData::Owned(abd) => abd.as_mut_slice(),
        ColumnData::Empty => &mut [],
    }
}

/// Redundancy geometry for one logical I/O
#[derive(Debug)]
pub struct RaidzMap<'a> {
    abd: &'a mut Abd,
    rows: Vec<RaidzRow>,
    io_offset: u64,
    io_size: usize,
    ashift: u32,
    nparity: usize,
    /// Allocated size including padding (single-row maps)
    asize: u64,
}

#[inline]
fn roundup(x: u64, align: u64) -> u64 {
    x.div_ceil(align) * align
}

fn alloc_parity(size: usize) -> Result<ColumnData> {
    Abd::alloc(size).map(ColumnData::Owned)
}

fn check_common(abd: &Abd, io_size: usize, ashift: u32, nparity: usize) -> Result<()> {
    if !(1..=RAIDZ_MAXPARITY).contains(&nparity) {
        return Err(RaidzError::InvalidParity(nparity));
    }
    if !(9..=16).contains(&ashift) {
        return Err(RaidzError::InvalidGeometry(format!(
            "ashift {} outside of 9..=16",
            ashift
        )));
    }
    // A partial trailing sector is dropped
    if io_size >> ashift == 0 {
        return Err(RaidzError::InvalidGeometry(format!(
            "I/O size {} is smaller than one {}-byte sector",
            io_size,
            1usize << ashift
        )));
    }
    if io_size > abd.len() {
        return Err(RaidzError::InvalidGeometry(format!(
            "I/O size {} exceeds buffer of {} bytes",
            io_size,
            abd.len()
        )));
    }
    Ok(())
}

impl<'a> RaidzMap<'a> {
    /// Build the multi-row, expansion-aware layout
    ///
    /// `physical_cols` is the current number of children and `logical_cols`
    /// the row width the block was written with. While a reflow is in
    /// progress `reflow_offset` is the logical byte offset reached so far:
    /// rows whose data lies before it use `physical_cols`, rows that reach it
    /// use the pre-expansion width `physical_cols - 1`. `None` means no reflow
    /// is running.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        abd: &'a mut Abd,
        io_offset: u64,
        io_size: usize,
        ashift: u32,
        physical_cols: usize,
        logical_cols: usize,
        nparity: usize,
        reflow_offset: Option<u64>,
    ) -> Result<Self> {
        check_common(abd, io_size, ashift, nparity)?;
        if logical_cols <= nparity {
            return Err(RaidzError::InvalidGeometry(format!(
                "{} logical columns cannot hold {} parity columns plus data",
                logical_cols, nparity
            )));
        }
        if physical_cols < logical_cols {
            return Err(RaidzError::InvalidGeometry(format!(
                "{} physical columns is fewer than {} logical columns",
                physical_cols, logical_cols
            )));
        }
        let reflow_sector = reflow_offset.map_or(u64::MAX, |off| off >> ashift);
        if reflow_offset.is_some() && physical_cols - 1 < logical_cols {
            return Err(RaidzError::InvalidGeometry(format!(
                "reflow in progress but pre-expansion width {} is narrower than {} logical columns",
                physical_cols - 1,
                logical_cols
            )));
        }

        let sector = 1usize << ashift;
        let ndata = (logical_cols - nparity) as u64;
        let s = (io_size >> ashift) as u64;
        let q = s / ndata;
        let r = s - q * ndata;
        let bc = if r == 0 { 0 } else { r + nparity as u64 };
        let tot = s + nparity as u64 * (q + u64::from(r != 0));
        let rows = tot.div_ceil(logical_cols as u64);
        let cols = tot.min(logical_cols as u64) as usize;

        debug!(
            "raidz map: offset={:#x} size={} ashift={} phys={} logical={} nparity={} rows={} cols={} bc={}",
            io_offset, io_size, ashift, physical_cols, logical_cols, nparity, rows, cols, bc
        );

        let mut row_list = Vec::new();
        row_list
            .try_reserve_exact(rows as usize)
            .map_err(|_| RaidzError::OutOfMemory {
                bytes: rows as usize * std::mem::size_of::<RaidzRow>(),
            })?;

        for row in 0..rows {
            let mut rr = RaidzRow::alloc(cols, nparity);
            let b = (io_offset >> ashift) + row * logical_cols as u64;

            let mut row_phys_cols = physical_cols as u64;
            if b + ndata > reflow_sector {
                row_phys_cols -= 1;
            }

            let mut child_id = b % row_phys_cols;
            let mut child_offset = (b / row_phys_cols) << ashift;
            let last_row = row == rows - 1;
            if last_row {
                rr.bigcols = bc as usize;
            }

            for c in 0..cols {
                if child_id >= row_phys_cols {
                    child_id -= row_phys_cols;
                    child_offset += sector as u64;
                }
                let mut rc = RaidzCol::new(child_id as usize, child_offset);

                if c < nparity {
                    rc.size = sector;
                    rc.data = alloc_parity(sector)?;
                } else if last_row && bc != 0 && c as u64 >= bc {
                    // Phantom sector of a short row: no I/O, zero for parity math
                    rc.size = 0;
                    rc.data = ColumnData::Empty;
                } else {
                    let dc = (c - nparity) as u64;
                    let off = if (c as u64) < bc || r == 0 {
                        dc * rows + row
                    } else {
                        r * rows + (dc - r) * (rows - 1) + row
                    };
                    rc.size = sector;
                    rc.data = ColumnData::View {
                        offset: (off as usize) << ashift,
                        len: sector,
                    };
                }
                trace!(
                    "row {} col {}: dev {} offset {:#x} size {}",
                    row,
                    c,
                    rc.devidx,
                    rc.offset,
                    rc.size
                );
                rr.columns.push(rc);
                child_id += 1;
            }

            if rr.firstdatacol == 1 && rr.cols > 1 && io_offset & PARITY_SWAP_BIT != 0 {
                rr.swap_parity_with_first_data();
            }
            row_list.push(rr);
        }

        let map = Self {
            abd,
            rows: row_list,
            io_offset,
            io_size,
            ashift,
            nparity,
            asize: tot << ashift,
        };
        debug_assert_eq!(map.total_column_bytes(), tot << ashift);
        Ok(map)
    }

    /// Build the classic single-row layout over `dcols` children
    pub fn build_single_row(
        abd: &'a mut Abd,
        io_offset: u64,
        io_size: usize,
        ashift: u32,
        dcols: usize,
        nparity: usize,
    ) -> Result<Self> {
        check_common(abd, io_size, ashift, nparity)?;
        if dcols <= nparity {
            return Err(RaidzError::InvalidGeometry(format!(
                "{} children cannot hold {} parity columns plus data",
                dcols, nparity
            )));
        }

        let np = nparity as u64;
        let dcols64 = dcols as u64;
        let b = io_offset >> ashift;
        let s = (io_size >> ashift) as u64;
        let f = b % dcols64;
        let o = (b / dcols64) << ashift;

        let q = s / (dcols64 - np);
        let r = s - q * (dcols64 - np);
        let bc = if r == 0 { 0 } else { r + np };
        let tot = s + np * (q + u64::from(r != 0));

        let (acols, scols) = if q == 0 {
            (bc, dcols64.min(roundup(bc, np + 1)))
        } else {
            (dcols64, dcols64)
        };

        debug!(
            "raidz single-row map: offset={:#x} size={} ashift={} dcols={} nparity={} q={} r={} acols={} scols={}",
            io_offset, io_size, ashift, dcols, nparity, q, r, acols, scols
        );

        let mut rr = RaidzRow::alloc(acols as usize, nparity);
        rr.scols = scols as usize;
        rr.bigcols = bc as usize;
        rr.skipstart = bc as usize;

        let mut asize = 0u64;
        let mut data_off = 0usize;
        for c in 0..scols {
            let mut col = f + c;
            let mut coff = o;
            if col >= dcols64 {
                col -= dcols64;
                coff += 1u64 << ashift;
            }
            let mut rc = RaidzCol::new(col as usize, coff);
            let sectors = if c >= acols {
                0
            } else if c < bc {
                q + 1
            } else {
                q
            };
            rc.size = (sectors << ashift) as usize;
            asize += sectors << ashift;

            if c < np {
                rc.data = alloc_parity(rc.size)?;
            } else if c < acols {
                rc.data = ColumnData::View {
                    offset: data_off,
                    len: rc.size,
                };
                data_off += rc.size;
            }
            rr.columns.push(rc);
        }

        debug_assert_eq!(asize, tot << ashift);
        let padded = roundup(asize, (np + 1) << ashift);
        rr.nskip = (roundup(tot, np + 1) - tot) as usize;

        if rr.firstdatacol == 1 && io_offset & PARITY_SWAP_BIT != 0 {
            rr.swap_parity_with_first_data();
            if rr.skipstart == 0 {
                rr.skipstart = 1;
            }
        }

        Ok(Self {
            abd,
            rows: vec![rr],
            io_offset,
            io_size,
            ashift,
            nparity,
            asize: padded,
        })
    }

    pub fn rows(&self) -> &[RaidzRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [RaidzRow] {
        &mut self.rows
    }

    pub fn row(&self, index: usize) -> &RaidzRow {
        &self.rows[index]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut RaidzRow {
        &mut self.rows[index]
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn nparity(&self) -> usize {
        self.nparity
    }

    pub fn ashift(&self) -> u32 {
        self.ashift
    }

    pub fn io_offset(&self) -> u64 {
        self.io_offset
    }

    pub fn io_size(&self) -> usize {
        self.io_size
    }

    /// Allocated size on the group, padding included
    pub fn asize(&self) -> u64 {
        self.asize
    }

    /// The caller's I/O buffer
    pub fn abd(&self) -> &Abd {
        self.abd
    }

    pub fn column_data(&self, row: usize, col: usize) -> &[u8] {
        column_slice(self.abd.as_slice(), &self.rows[row].columns[col])
    }

    pub fn column_data_mut(&mut self, row: usize, col: usize) -> &mut [u8] {
        column_slice_mut(self.abd.as_mut_slice(), &mut self.rows[row].columns[col])
    }

    /// Split into the I/O buffer and the rows so both can be borrowed at once
    pub fn split_mut(&mut self) -> (&mut [u8], &mut [RaidzRow]) {
        (self.abd.as_mut_slice(), &mut self.rows)
    }

    /// Sum of all column sizes over all rows
    pub fn total_column_bytes(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|rr| rr.columns.iter())
            .map(|rc| rc.size as u64)
            .sum()
    }

    /// Flag every active column as read
    pub fn mark_tried(&mut self) {
        for rr in &mut self.rows {
            let cols = rr.cols;
            for rc in &mut rr.columns[..cols] {
                rc.tried = true;
            }
        }
    }

    /// Clear per-column error and read state
    pub fn clear_errors(&mut self) {
        for rr in &mut self.rows {
            for rc in &mut rr.columns {
                rc.error = None;
                rc.tried = false;
                rc.skipped = false;
            }
            rr.missing_data = 0;
            rr.missing_parity = 0;
        }
    }

    /// Copy every row's data columns into a buffer owned by the row
    ///
    /// The copy survives later writes to the caller's buffer, so the
    /// original contents can still be reported once a repair has rewritten
    /// the data columns.
    pub fn detach_copy(&mut self) -> Result<()> {
        let io = self.abd.as_slice();
        for rr in &mut self.rows {
            let data = &rr.columns[rr.firstdatacol..rr.cols];
            let total: usize = data.iter().map(|rc| rc.size).sum();
            let mut copy = Abd::alloc(total)?;
            let mut off = 0;
            for rc in data {
                let bytes = column_slice(io, rc);
                copy.view_mut(off, bytes.len()).copy_from_slice(bytes);
                off += bytes.len();
            }
            rr.orig_copy = Some(copy);
        }
        Ok(())
    }
}

/// Allocated size of a `psize`-byte block on a group of `cols` children
pub fn raidz_asize(psize: u64, ashift: u32, cols: u64, nparity: u64) -> u64 {
    let mut asize = ((psize - 1) >> ashift) + 1;
    asize += nparity * ((asize + cols - nparity - 1) / (cols - nparity));
    roundup(asize, nparity + 1) << ashift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(len: usize) -> Abd {
        Abd::from_vec((0..len).map(|i| (i % 251) as u8).collect())
    }

    #[test]
    fn rejects_bad_parity() {
        let mut abd = filled(4096);
        let err = RaidzMap::build(&mut abd, 0, 4096, 9, 8, 8, 4, None).unwrap_err();
        assert_eq!(err, RaidzError::InvalidParity(4));
    }

    #[test]
    fn rejects_sub_sector_size() {
        let mut abd = filled(4096);
        let err = RaidzMap::build(&mut abd, 0, 511, 9, 8, 8, 1, None).unwrap_err();
        assert!(matches!(err, RaidzError::InvalidGeometry(_)));
        let err = RaidzMap::build_single_row(&mut abd, 0, 4095, 12, 8, 1).unwrap_err();
        assert!(matches!(err, RaidzError::InvalidGeometry(_)));
    }

    #[test]
    fn partial_trailing_sector_is_dropped() {
        let mut abd = filled(21 * 512);
        let map = RaidzMap::build(&mut abd, 0, 21 * 512, 12, 6, 6, 2, None).unwrap();
        // Two whole 4 KiB sectors over four data columns: one short row
        assert_eq!(map.nrows(), 1);
        assert_eq!(map.total_column_bytes(), 4 * 4096);
        assert_eq!(map.io_size(), 21 * 512);

        let map = RaidzMap::build_single_row(&mut abd, 0, 21 * 512, 12, 6, 2).unwrap();
        assert_eq!(map.total_column_bytes(), 4 * 4096);
    }

    #[test]
    fn rejects_size_beyond_buffer() {
        let mut abd = filled(1024);
        let err = RaidzMap::build_single_row(&mut abd, 0, 2048, 9, 4, 1).unwrap_err();
        assert!(matches!(err, RaidzError::InvalidGeometry(_)));
    }

    #[test]
    fn single_full_row() {
        let mut abd = filled(512 * 8);
        let map = RaidzMap::build(&mut abd, 0, 512 * 8, 9, 9, 9, 1, None).unwrap();
        assert_eq!(map.nrows(), 1);
        let rr = map.row(0);
        assert_eq!(rr.cols, 9);
        assert_eq!(rr.bigcols, 0);
        for c in 1..9 {
            assert_eq!(
                rr.columns[c].data,
                ColumnData::View {
                    offset: (c - 1) * 512,
                    len: 512
                }
            );
            assert_eq!(rr.columns[c].devidx, c);
        }
    }

    #[test]
    fn short_row_interleave() {
        // 9 sectors over 8 data + 3 parity: one full row then a remainder
        let mut abd = filled(512 * 9);
        let map = RaidzMap::build(&mut abd, 0, 512 * 9, 9, 11, 11, 3, None).unwrap();
        assert_eq!(map.nrows(), 2);
        assert_eq!(map.row(1).bigcols, 4);

        let offsets: Vec<Option<usize>> = map.rows()[0].columns[3..]
            .iter()
            .map(|rc| match rc.data {
                ColumnData::View { offset, .. } => Some(offset / 512),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![Some(0), Some(2), Some(3), Some(4), Some(5), Some(6), Some(7), Some(8)]);
        assert_eq!(
            map.row(1).columns[3].data,
            ColumnData::View { offset: 512, len: 512 }
        );
        assert!(map.row(1).columns[4..].iter().all(|rc| rc.data == ColumnData::Empty));
        assert_eq!(map.total_column_bytes(), 15 * 512);
    }

    #[test]
    fn parity_swap_every_other_megabyte() {
        let mut abd = filled(512 * 4);
        let plain = RaidzMap::build(&mut abd, 0, 512 * 4, 9, 5, 5, 1, None).unwrap();
        let (d0, d1) = (plain.row(0).columns[0].devidx, plain.row(0).columns[1].devidx);
        drop(plain);
        let swapped = RaidzMap::build(&mut abd, 1 << 20, 512 * 4, 9, 5, 5, 1, None).unwrap();
        let b = (1u64 << 20) >> 9;
        let start = (b % 5) as usize;
        assert_eq!(swapped.row(0).columns[0].devidx, (start + 1) % 5);
        assert_eq!(swapped.row(0).columns[1].devidx, start);
        assert_eq!((d0, d1), (0, 1));
    }

    #[test]
    fn double_parity_never_swaps() {
        let mut abd = filled(512 * 4);
        let map = RaidzMap::build(&mut abd, 1 << 20, 512 * 4, 9, 6, 6, 2, None).unwrap();
        let b = (1u64 << 20) >> 9;
        assert_eq!(map.row(0).columns[0].devidx, (b % 6) as usize);
    }

    #[test]
    fn reflow_straddling_rows_use_old_width() {
        let mut abd = filled(512 * 40);
        let map = RaidzMap::build(&mut abd, 0, 512 * 40, 9, 6, 5, 1, Some(512 * 10)).unwrap();
        for (i, rr) in map.rows().iter().enumerate() {
            let b = (i * 5) as u64;
            let width = if b + 4 > 10 { 5 } else { 6 };
            assert_eq!(rr.columns[0].devidx as u64, b % width, "row {}", i);
            assert_eq!(rr.columns[0].offset, (b / width) << 9, "row {}", i);
        }
    }

    #[test]
    fn single_row_small_io_skips() {
        // 1 data sector on 6 children with double parity
        let mut abd = filled(512);
        let map = RaidzMap::build_single_row(&mut abd, 0, 512, 9, 6, 2).unwrap();
        let rr = map.row(0);
        assert_eq!(rr.cols, 3);
        assert_eq!(rr.scols, 3);
        assert_eq!(rr.nskip, 0);
        assert_eq!(map.asize(), 3 * 512);
    }

    #[test]
    fn single_row_swap_moves_skipstart() {
        let mut abd = filled(512 * 8);
        let map = RaidzMap::build_single_row(&mut abd, 1 << 20, 512 * 8, 9, 5, 1).unwrap();
        let rr = map.row(0);
        assert_eq!(rr.bigcols, 0);
        assert_eq!(rr.skipstart, 1);
        assert_eq!(rr.columns[1].size, 2 * 512);
    }

    #[test]
    fn single_row_column_sizes() {
        let mut abd = filled(512 * 7);
        let map = RaidzMap::build_single_row(&mut abd, 0, 512 * 7, 9, 5, 1).unwrap();
        let rr = map.row(0);
        // q = 1, r = 3, bc = 4
        let sizes: Vec<usize> = rr.columns.iter().map(|rc| rc.size / 512).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2, 1]);
        assert_eq!(rr.nskip, 1);
        assert_eq!(map.asize(), 10 * 512);
    }

    #[test]
    fn asize_matches_single_row_allocation() {
        for &(psize, cols, np) in &[(512u64, 5u64, 1u64), (4096, 8, 2), (512 * 7, 5, 1), (131072, 12, 3)] {
            let mut abd = filled(psize as usize);
            let map = RaidzMap::build_single_row(&mut abd, 0, psize as usize, 9, cols as usize, np as usize)
                .unwrap();
            assert_eq!(raidz_asize(psize, 9, cols, np), map.asize(), "psize {}", psize);
        }
    }

    #[test]
    fn detach_copy_keeps_original() {
        let mut abd = filled(512 * 4);
        let mut map = RaidzMap::build(&mut abd, 0, 512 * 4, 9, 5, 5, 1, None).unwrap();
        map.detach_copy().unwrap();
        let before = map.column_data(0, 2).to_vec();
        map.column_data_mut(0, 2).fill(0xEE);
        assert_eq!(map.row(0).original_column(2).unwrap(), before.as_slice());
        assert!(map.row(0).original_column(0).is_none());
    }
}
