use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn user(id: &str) -> CachedUser {
    CachedUser { id: id.to_owned(), role: "client".to_owned(), ..CachedUser::default() }
}

#[test]
fn publish_reaches_every_listener_in_order() {
    let channel = EventChannel::<AuthSuccess>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let a = Rc::clone(&seen);
    let _sa = channel.subscribe(move |e| a.borrow_mut().push(format!("a:{}", e.user.id)));
    let b = Rc::clone(&seen);
    let _sb = channel.subscribe(move |e| b.borrow_mut().push(format!("b:{}", e.user.id)));

    assert_eq!(channel.publish(&AuthSuccess { user: user("u1") }), 2);
    assert_eq!(channel.publish(&AuthSuccess { user: user("u2") }), 2);
    assert_eq!(*seen.borrow(), vec!["a:u1", "b:u1", "a:u2", "b:u2"]);
}

#[test]
fn dropping_subscription_detaches_listener() {
    let channel = EventChannel::<u32>::new();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let sub = channel.subscribe(move |n| *h.borrow_mut() += n);

    channel.publish(&2);
    drop(sub);
    assert_eq!(channel.publish(&5), 0);
    assert_eq!(*hits.borrow(), 2);
    assert_eq!(channel.listener_count(), 0);
}

#[test]
fn forgotten_subscription_stays_attached() {
    let channel = EventChannel::<u32>::new();
    channel.subscribe(|_| {}).forget();
    assert_eq!(channel.listener_count(), 1);
}

#[test]
fn listener_may_publish_reentrantly() {
    let channel = EventChannel::<u32>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let relay = channel.clone();
    let s = Rc::clone(&seen);
    let _sub = channel.subscribe(move |n| {
        s.borrow_mut().push(*n);
        if *n > 0 {
            relay.publish(&(n - 1));
        }
    });

    channel.publish(&2);
    assert_eq!(*seen.borrow(), vec![2, 1, 0]);
}

#[test]
fn subscription_outliving_channel_is_harmless() {
    let channel = EventChannel::<u32>::new();
    let sub = channel.subscribe(|_| {});
    drop(channel);
    drop(sub);
}

#[test]
fn process_wide_channel_is_shared() {
    let first = auth_events();
    let second = auth_events();
    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let _sub = first.subscribe(move |_| *h.borrow_mut() += 1);
    second.publish(&AuthSuccess { user: user("u1") });
    assert_eq!(*hits.borrow(), 1);
}
