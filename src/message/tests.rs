//! Tests for outbound slicing and inbound accumulation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use proptest::{collection::vec, prelude::*, sample::Index};
use rstest::{fixture, rstest};

use super::Message;
use crate::fragment::{
    FragmentStatus,
    MAX_SLICE_PAYLOAD,
    Slice,
    SliceError,
    SliceHeader,
    TransactionId,
};

const PEER_PORT: u16 = 4000;

fn peer_ip() -> IpAddr { IpAddr::V4(Ipv4Addr::LOCALHOST) }

fn id(byte: u8) -> TransactionId { TransactionId::new([byte; 16]) }

fn patterned(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("fits in u8"))
        .collect()
}

fn outbound(len: usize) -> Message {
    Message::for_sending(id(1), peer_ip(), PEER_PORT, patterned(len))
}

fn slice(tag: u8, index: u32, count: u32, payload: &[u8]) -> Slice {
    Slice::new(SliceHeader::new(id(tag), index, count), payload.to_vec()).expect("valid slice")
}

#[fixture]
fn inbound() -> Message { Message::new_accumulating(peer_ip(), PEER_PORT) }

#[rstest]
#[case(1)]
#[case(999)]
#[case(MAX_SLICE_PAYLOAD)]
fn short_payload_travels_in_one_slice(#[case] len: usize, mut inbound: Message) {
    let message = outbound(len);
    let slices = message.to_slices().expect("slice payload");

    assert_eq!(slices.len(), 1);
    let only = slices.into_iter().next().expect("one slice");
    assert_eq!(only.count(), 1);
    assert_eq!(only.index(), 0);

    assert_eq!(inbound.append(only), Ok(FragmentStatus::Complete));
    assert_eq!(inbound.payload(), message.payload());
    assert_eq!(inbound.transaction_id(), Some(id(1)));
    assert_eq!(inbound.received_slices(), 0);
}

#[rstest]
#[case(1000, 1)]
#[case(1001, 2)]
#[case(2000, 2)]
#[case(2001, 3)]
#[case(3500, 4)]
fn slice_count_is_ceiling_of_length(#[case] len: usize, #[case] expected: usize) {
    let slices = outbound(len).to_slices().expect("slice payload");

    assert_eq!(slices.len(), expected);
    for (position, slice) in slices.iter().enumerate() {
        assert_eq!(usize::try_from(slice.index()).expect("index fits"), position);
        assert_eq!(usize::try_from(slice.count()).expect("count fits"), expected);
        assert_eq!(slice.transaction_id(), id(1));
        assert!(slice.serialize().len() <= crate::fragment::SLICE_LEN);
    }
}

#[test]
fn empty_payload_yields_no_slices() {
    assert!(outbound(0).to_slices().expect("slice payload").is_empty());
    let empty = Message::new_accumulating(peer_ip(), PEER_PORT);
    assert!(empty.to_slices().expect("no payload").is_empty());
}

#[rstest]
fn reassembles_out_of_order(mut inbound: Message) {
    let message = outbound(2001);
    let mut slices = message.to_slices().expect("slice payload");
    slices.swap(0, 2);

    let statuses: Vec<_> = slices
        .into_iter()
        .map(|s| inbound.append(s).expect("consistent slice"))
        .collect();

    assert_eq!(
        statuses,
        vec![
            FragmentStatus::Incomplete,
            FragmentStatus::Incomplete,
            FragmentStatus::Complete,
        ]
    );
    assert_eq!(inbound.payload(), message.payload());
    assert_eq!(inbound.socket_addr(), SocketAddr::new(peer_ip(), PEER_PORT));
}

#[rstest]
fn duplicate_index_overwrites_without_completing(mut inbound: Message) {
    assert_eq!(
        inbound.append(slice(3, 0, 2, b"stale")),
        Ok(FragmentStatus::Incomplete)
    );
    assert_eq!(
        inbound.append(slice(3, 0, 2, b"fresh")),
        Ok(FragmentStatus::Incomplete)
    );
    assert_eq!(inbound.received_slices(), 1);
    assert_eq!(inbound.expected_slices(), Some(2));
    assert!(!inbound.is_complete());

    assert_eq!(
        inbound.append(slice(3, 1, 2, b"!")),
        Ok(FragmentStatus::Complete)
    );
    assert_eq!(inbound.payload(), Some(&b"fresh!"[..]));
}

#[rstest]
fn foreign_transaction_is_ignored(mut inbound: Message) {
    inbound.append(slice(4, 0, 2, b"a")).expect("first slice");

    assert_eq!(
        inbound.append(slice(5, 1, 2, b"b")),
        Ok(FragmentStatus::Incomplete)
    );
    assert_eq!(inbound.received_slices(), 1);
    assert_eq!(inbound.transaction_id(), Some(id(4)));
}

#[rstest]
fn count_disagreement_is_rejected(mut inbound: Message) {
    inbound.append(slice(6, 0, 3, b"a")).expect("first slice");

    assert_eq!(
        inbound.append(slice(6, 1, 2, b"b")),
        Err(SliceError::CountMismatch {
            expected: 3,
            found: 2,
        })
    );
    assert_eq!(inbound.received_slices(), 1);
}

/// A single-slice fragment replaces an accumulation in progress, whatever its
/// id. The socket avoids this by never routing single slices through the
/// cache, but the message itself keeps the behaviour.
#[rstest]
fn single_slice_overrides_partial_accumulation(mut inbound: Message) {
    inbound.append(slice(7, 0, 2, b"partial")).expect("first slice");

    assert_eq!(
        inbound.append(slice(8, 0, 1, b"whole")),
        Ok(FragmentStatus::Complete)
    );
    assert_eq!(inbound.transaction_id(), Some(id(8)));
    assert_eq!(inbound.payload(), Some(&b"whole"[..]));
    assert_eq!(inbound.expected_slices(), None);
}

#[test]
fn set_payload_and_address_update_outbound_message() {
    let mut message = Message::new(Vec::new(), SocketAddr::new(peer_ip(), 1));
    message.set_payload(patterned(1500));
    message.set_socket_address(SocketAddr::new(peer_ip(), 2));

    assert_eq!(message.port(), 2);
    assert_eq!(message.address(), peer_ip());
    assert_eq!(message.to_slices().expect("slice payload").len(), 2);
    assert_eq!(message.into_payload(), Some(patterned(1500)));
}

fn permuted(len: usize, picks: &[Index]) -> (Vec<u8>, Vec<Slice>) {
    let message = outbound(len);
    let mut slices = message.to_slices().expect("slice payload");
    for (i, pick) in picks.iter().enumerate().take(slices.len()) {
        let j = i + pick.index(slices.len() - i);
        slices.swap(i, j);
    }
    (message.into_payload().expect("outbound payload"), slices)
}

proptest! {
    /// Any delivery order reassembles the original payload, completing on
    /// the last slice and not before.
    #[test]
    fn any_permutation_reassembles(
        len in prop_oneof![Just(1000usize), Just(1001), Just(2000), Just(2001), 1usize..=5000],
        picks in vec(any::<Index>(), 6),
    ) {
        let (payload, slices) = permuted(len, &picks);
        let total = slices.len();
        let mut inbound = Message::new_accumulating(peer_ip(), PEER_PORT);

        for (position, slice) in slices.into_iter().enumerate() {
            let status = inbound.append(slice).expect("consistent slice");
            prop_assert_eq!(status.is_complete(), position + 1 == total);
        }
        prop_assert_eq!(inbound.payload(), Some(payload.as_slice()));
    }
}
