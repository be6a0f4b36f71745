//! Projection of parsed tables onto typed records.
//!
//! Each record declares a static `(tag, accessor)` list. The list is turned
//! into a lookup map once, on first use, and every projection afterwards is a
//! single pass over the parsed table.

use hp_common::{MetricTable, Netstat, SectionTable, Snmp, VmStatInfo};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Accessor for one destination field of `T`.
pub type FieldAccessor<T, V> = fn(&mut T) -> &mut V;

/// Tag to field mapping for a record type.
pub struct FieldTable<T, V> {
    fields: HashMap<&'static str, FieldAccessor<T, V>>,
}

impl<T, V> FieldTable<T, V> {
    pub fn new(entries: &[(&'static str, FieldAccessor<T, V>)]) -> Self {
        Self {
            fields: entries.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy every entry of `source` that has a destination into `target`.
    /// Unknown keys are dropped; fields with no entry keep their value.
    pub fn project<'a, I>(&self, target: &mut T, source: I) -> usize
    where
        I: IntoIterator<Item = (&'a String, &'a V)>,
        V: Clone + 'a,
    {
        let mut assigned = 0;
        for (key, value) in source {
            if let Some(field) = self.fields.get(key.as_str()) {
                *field(target) = value.clone();
                assigned += 1;
            }
        }
        assigned
    }
}

macro_rules! field_table {
    ($ty:ty, $v:ty; $($tag:literal => $field:ident),+ $(,)?) => {
        FieldTable::<$ty, $v>::new(&[
            $(($tag, {
                fn access(r: &mut $ty) -> &mut $v {
                    &mut r.$field
                }
                access as FieldAccessor<$ty, $v>
            })),+
        ])
    };
}

fn vmstat_fields() -> &'static FieldTable<VmStatInfo, u64> {
    static TABLE: OnceLock<FieldTable<VmStatInfo, u64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        field_table!(VmStatInfo, u64;
            "nr_free_pages" => nr_free_pages,
            "nr_inactive_anon" => nr_inactive_anon,
            "nr_active_anon" => nr_active_anon,
            "nr_inactive_file" => nr_inactive_file,
            "nr_active_file" => nr_active_file,
            "nr_unevictable" => nr_unevictable,
            "nr_mlock" => nr_mlock,
            "nr_anon_pages" => nr_anon_pages,
            "nr_mapped" => nr_mapped,
            "nr_file_pages" => nr_file_pages,
            "nr_dirty" => nr_dirty,
            "nr_writeback" => nr_writeback,
            "nr_slab_reclaimable" => nr_slab_reclaimable,
            "nr_slab_unreclaimable" => nr_slab_unreclaimable,
            "nr_page_table_pages" => nr_page_table_pages,
            "nr_kernel_stack" => nr_kernel_stack,
            "nr_bounce" => nr_bounce,
            "nr_shmem" => nr_shmem,
            "nr_dirtied" => nr_dirtied,
            "nr_written" => nr_written,
            "pgpgin" => pgpgin,
            "pgpgout" => pgpgout,
            "pswpin" => pswpin,
            "pswpout" => pswpout,
            "pgalloc_dma" => pgalloc_dma,
            "pgalloc_dma32" => pgalloc_dma32,
            "pgalloc_normal" => pgalloc_normal,
            "pgfree" => pgfree,
            "pgactivate" => pgactivate,
            "pgdeactivate" => pgdeactivate,
            "pgfault" => pgfault,
            "pgmajfault" => pgmajfault,
            "pgsteal_kswapd" => pgsteal_kswapd,
            "pgsteal_direct" => pgsteal_direct,
            "pgscan_kswapd" => pgscan_kswapd,
            "pgscan_direct" => pgscan_direct,
            "oom_kill" => oom_kill,
            "compact_stall" => compact_stall,
            "thp_fault_alloc" => thp_fault_alloc,
            "thp_collapse_alloc" => thp_collapse_alloc,
        )
    })
}

fn snmp_sections() -> &'static FieldTable<Snmp, MetricTable> {
    static TABLE: OnceLock<FieldTable<Snmp, MetricTable>> = OnceLock::new();
    TABLE.get_or_init(|| {
        field_table!(Snmp, MetricTable;
            "Ip" => ip,
            "Icmp" => icmp,
            "IcmpMsg" => icmp_msg,
            "Tcp" => tcp,
            "Udp" => udp,
            "UdpLite" => udp_lite,
        )
    })
}

fn netstat_sections() -> &'static FieldTable<Netstat, MetricTable> {
    static TABLE: OnceLock<FieldTable<Netstat, MetricTable>> = OnceLock::new();
    TABLE.get_or_init(|| {
        field_table!(Netstat, MetricTable;
            "TcpExt" => tcp_ext,
            "IpExt" => ip_ext,
            "MPTcpExt" => mptcp_ext,
        )
    })
}

pub fn project_vmstat(table: &MetricTable) -> VmStatInfo {
    let mut info = VmStatInfo::default();
    vmstat_fields().project(&mut info, table);
    info
}

pub fn project_snmp(table: &SectionTable) -> Snmp {
    let mut snmp = Snmp::default();
    snmp_sections().project(&mut snmp, table);
    snmp
}

pub fn project_netstat(table: &SectionTable) -> Netstat {
    let mut netstat = Netstat::default();
    netstat_sections().project(&mut netstat, table);
    netstat
}
