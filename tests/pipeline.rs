//! Host-side end-to-end tests through the public API.
//!
//! Receive: producer reserve/commit, filter update through the writer,
//! classification through a filter reader, client collection and release.
//! Transmit: client sends, shaper gating, completion and timestamp report.

use mii_mac::constants::{CREDIT_FRACTIONAL_BITS, DEFAULT_TIMER_HZ};
use mii_mac::tx::{ifg_ticks, wait_required};
use mii_mac::{
    Disposition, FilterError, LinkState, MacAddrFilter, MacAddress, MacConfig, MacFilterEntry,
    MemPool, PacketHeader, PoolPair, PortState, Priority, QueuePolicy, RxDispatcher, Speed,
    TimestampEntry, TxScheduler,
};

const STATION: [u8; 6] = [0x02, 0x11, 0x22, 0x33, 0x44, 0x55];
const PTP_MCAST: [u8; 6] = [0x01, 0x1B, 0x19, 0x00, 0x00, 0x00];

fn frame(dst: [u8; 6], ethertype: u16, len: usize) -> Vec<u8> {
    let mut f = Vec::with_capacity(len);
    f.extend_from_slice(&dst);
    f.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x99]);
    f.extend_from_slice(&ethertype.to_be_bytes());
    let mut i = 0u8;
    while f.len() < len {
        f.push(i);
        i = i.wrapping_add(1);
    }
    f
}

fn sample(pool: &mut MemPool<'_>, bytes: &[u8], timestamp: u32) -> bool {
    let mut res = pool.reserve();
    pool.write(&mut res, bytes);
    pool.commit(res, PacketHeader::new(0, timestamp).with_src_port(0))
        .is_some()
}

#[test]
fn receive_filter_dispatch_release() {
    static FILTER: MacAddrFilter<64> = MacAddrFilter::new();

    let config = MacConfig::new()
        .with_queue_policy(QueuePolicy::LowPriorityFirst)
        .with_filter_threads(2);
    config.validate().unwrap();
    FILTER.configure(&config).unwrap();
    let mut port = PortState::from_config(&config);
    port.set_ingress_timestamp_latency(Speed::Mbps100, 12);

    let mut arena = vec![0u8; 8192];
    let mut pools =
        PoolPair::for_config(&config, MemPool::new(&mut arena, Priority::Low).unwrap(), None)
            .unwrap();
    let mut rx: RxDispatcher<3, 8> = RxDispatcher::new(config.queue_policy);
    rx.client_mut(2).unwrap().add_ethertype_filter(0x88F7).unwrap();
    rx.client_mut(2).unwrap().enable_link_status_notification();
    assert!(rx.set_link_state(&mut port, LinkState::Up, Speed::Mbps100));
    assert!(rx.client_mut(2).unwrap().take_status_update());

    {
        let mut writer = FILTER.writer().unwrap();
        writer
            .add_entry(0, false, &MacFilterEntry::new(MacAddress(STATION)).with_appdata(1))
            .unwrap();
        writer.add_entry(1, false, &MacFilterEntry::new(MacAddress::BROADCAST)).unwrap();
        writer.add_entry(2, true, &MacFilterEntry::new(MacAddress(PTP_MCAST))).unwrap();
        assert_eq!(
            writer.add_entry(0, false, &MacFilterEntry::new(MacAddress([0; 6]))),
            Err(FilterError::ZeroAddress)
        );
    }

    let unicast = frame(STATION, 0x0800, 128);
    let broadcast = frame(MacAddress::BROADCAST.octets(), 0x0806, 60);
    let ptp = frame(PTP_MCAST, 0x88F7, 90);
    let stranger = frame([0x02, 9, 9, 9, 9, 9], 0x0800, 60);
    for (i, f) in [&unicast, &broadcast, &ptp, &stranger].into_iter().enumerate() {
        assert!(sample(&mut pools.lp, f, 1000 * (i as u32 + 1)));
    }

    let reader = FILTER.reader(0).unwrap();
    let mut outcomes = Vec::new();
    while let Some((_, disposition)) = rx.process(&mut pools, &reader, &port) {
        outcomes.push(disposition);
    }
    assert_eq!(
        outcomes,
        [
            Disposition::Delivered(1),
            Disposition::Delivered(1),
            Disposition::Delivered(1),
            Disposition::NoMatch,
        ]
    );

    let mut buf = [0u8; 1600];
    let info = rx.get_packet(0, &mut pools, &mut buf).unwrap();
    assert_eq!(&buf[..info.len], &unicast[..]);
    assert_eq!(info.timestamp, 1000 - 12);
    assert_eq!(info.filter_data, 1);

    let info = rx.get_packet(2, &mut pools, &mut buf).unwrap();
    assert_eq!(&buf[..info.len], &ptp[..]);

    let info = rx.get_packet(1, &mut pools, &mut buf).unwrap();
    assert_eq!(&buf[..info.len], &broadcast[..]);

    assert!(rx.get_packet(0, &mut pools, &mut buf).is_none());
    assert!(pools.lp.is_empty());
    assert_eq!(rx.rejected(), 1);

    // Removing the entry stops delivery
    drop(reader);
    assert!(FILTER.writer().unwrap().delete_entry(
        0,
        false,
        &MacFilterEntry::new(MacAddress(STATION))
    ));
    assert!(sample(&mut pools.lp, &unicast, 0));
    let reader = FILTER.reader(1).unwrap();
    assert_eq!(
        rx.process(&mut pools, &reader, &port).map(|(_, d)| d),
        Some(Disposition::NoMatch)
    );
}

#[test]
fn producer_never_blocks_when_clients_stall() {
    static FILTER: MacAddrFilter<16> = MacAddrFilter::new();
    let config = MacConfig::new();
    FILTER.configure(&config).unwrap();
    assert!(FILTER.reader(1).is_none());
    FILTER
        .writer()
        .unwrap()
        .add_entry(0, false, &MacFilterEntry::new(MacAddress(STATION)))
        .unwrap();
    let reader = FILTER.reader(0).unwrap();
    let port = PortState::new();

    let mut arena = vec![0u8; 2048];
    let mut pools =
        PoolPair::for_config(&config, MemPool::new(&mut arena, Priority::Low).unwrap(), None)
            .unwrap();
    let mut rx: RxDispatcher<1, 4> = RxDispatcher::default();
    let f = frame(STATION, 0x0800, 200);

    let mut accepted = 0;
    for _ in 0..50 {
        if sample(&mut pools.lp, &f, 0) {
            accepted += 1;
        }
        rx.process_all(&mut pools, &reader, &port);
    }
    assert!(accepted < 50);
    assert!(pools.lp.dropped() > 0);
    assert!(rx.client(0).unwrap().dropped_packets() > 0);

    // Draining the client frees the pool again
    let mut buf = [0u8; 256];
    while rx.get_packet(0, &mut pools, &mut buf).is_some() {}
    assert!(pools.lp.is_empty());
    assert!(sample(&mut pools.lp, &f, 0));
}

#[test]
fn transmit_shaper_and_timestamps() {
    let config = MacConfig::new().with_hp_queues(true).with_traffic_shaper(true);
    let mut port = PortState::from_config(&config);
    port.set_link_state(LinkState::Up, Speed::Mbps100);
    port.set_egress_timestamp_latency(Speed::Mbps100, 40);
    // Half the line rate: one bit of credit every two ticks at 100 MHz
    port.set_idle_slope(50_000_000);
    assert_eq!(port.qav_idle_slope, 1 << (CREDIT_FRACTIONAL_BITS - 1));

    let mut lp_arena = vec![0u8; 4096];
    let mut hp_arena = vec![0u8; 4096];
    let mut lp = MemPool::new(&mut lp_arena, Priority::Low).unwrap();
    let mut hp = MemPool::new(&mut hp_arena, Priority::High).unwrap();
    let mut sched: TxScheduler<2, 4, 4> = TxScheduler::new();

    let stream = frame(PTP_MCAST, 0x22F0, 476);
    sched.send_packet(&mut hp, 1, &stream, true, 0).unwrap();
    sched.send_packet(&mut hp, 1, &stream, true, 0).unwrap();
    sched.send_packet(&mut lp, 0, &frame(STATION, 0x0800, 60), false, 0).unwrap();

    // First stream frame goes out immediately
    let mut now = 0u32;
    let sel = sched.select_next(&port, now).unwrap();
    assert_eq!(sel.pkt.priority(), Priority::High);
    let end = now + 4000;
    sched.complete(&mut hp, sel, now, end, &port);
    now = end;

    // Credit is now -(476 + 24) * 8 bits; best effort goes first
    let gap = ifg_ticks(Speed::Mbps100, DEFAULT_TIMER_HZ);
    assert!(wait_required(end, end + gap, now + 1));
    now += gap;
    let sel = sched.select_next(&port, now).unwrap();
    assert_eq!(sel.pkt.priority(), Priority::Low);
    sched.complete(&mut lp, sel, now, now + 600, &port);

    // 4000 bits at half rate needs 8000 ticks since the first frame
    assert!(sched.select_next(&port, 7_000).is_none());
    let sel = sched.select_next(&port, 8_000).unwrap();
    assert_eq!(sel.pkt.priority(), Priority::High);
    sched.complete(&mut hp, sel, 8_000, 12_000, &port);

    assert_eq!(
        sched.get_timestamp(),
        Some(TimestampEntry {
            id: 1,
            timestamp: 40
        })
    );
    assert_eq!(
        sched.get_timestamp(),
        Some(TimestampEntry {
            id: 1,
            timestamp: 8_040
        })
    );
    assert_eq!(sched.get_timestamp(), None);
    assert!(lp.is_empty());
    assert!(hp.is_empty());
}
