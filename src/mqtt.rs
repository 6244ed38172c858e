// MQTT publishing side. The `Publisher` hands payloads to the `rumqttc`
// client from the foreground command loop; the background task polls the
// event loop, logs connection results, and matches delivery acknowledgements
// back to the original message so the operator can see what actually reached
// the broker.
//
// rumqttc assigns packet ids inside the event loop (there is no token
// returned from `publish` the way paho hands back a message id), so the
// foreground sends the in-flight record over a channel and the background
// task pairs it with the pkid when the `Outgoing::Publish` notification
// arrives. The record goes onto the channel *before* the publish request is
// enqueued: the event loop can emit `Outgoing::Publish` the moment the
// request lands, and pairing is only sound if the record is already visible
// by then. A submission the client rejects locally is followed by a
// `Withdrawn` marker so the stranded record cannot shift attribution onto
// the next publish.
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Incoming, Outgoing, QoS};
use tokio::sync::Notify;
use tokio::time::{self, Duration};

use crate::config::Settings;
use crate::payload::build_payload;
use crate::scoreboard::{self, Scoreboard};

/// Grace period after each publish so the event loop gets to run before the
/// next prompt. Best-effort UX for the interactive tool, not a delivery
/// guarantee.
const PUBLISH_GRACE: Duration = Duration::from_millis(50);

/// In-flight records older than this are swept; if an ack never arrives the
/// table must not grow forever.
const INFLIGHT_TTL: Duration = Duration::from_secs(600);

/// What we remember about a publish until its acknowledgement arrives.
#[derive(Debug, Clone)]
pub struct InflightRecord {
    topic: String,
    event: &'static str,
    payload: String,
    queued_at: Instant,
}

/// Foreground-to-background hand-off. `Withdrawn` retracts the record sent
/// immediately before it, for publishes the client refused locally; the
/// foreground is sequential, so the pair is always adjacent in the channel.
#[derive(Debug)]
pub enum Submission {
    Queued(InflightRecord),
    Withdrawn,
}

/// Foreground handle for publishing scoreboard state. Holds the resolved
/// topic/QoS/retain settings so callers never touch configuration again.
pub struct Publisher {
    client: AsyncClient,
    topic: String,
    qos: QoS,
    retain: bool,
    pending: Sender<Submission>,
}

impl Publisher {
    pub fn new(client: AsyncClient, settings: &Settings, pending: Sender<Submission>) -> Self {
        Publisher {
            client,
            topic: settings.topic.clone(),
            qos: settings.qos,
            retain: settings.retain,
            pending,
        }
    }

    /// Publish the current scoreboard snapshot with the given event label.
    /// A local submission failure is logged and swallowed: the state change
    /// that triggered this publish is deliberately not rolled back, so the
    /// operator keeps seeing their intent and the next command publishes the
    /// then-current state.
    pub async fn publish_state(&self, board: &Scoreboard, event: scoreboard::Event) {
        let payload = build_payload(board, event);

        // Record first, then enqueue. A closed channel just means tracking
        // is gone; the publish itself still goes out.
        let _ = self.pending.send(Submission::Queued(InflightRecord {
            topic: self.topic.clone(),
            event: event.as_str(),
            payload: payload.clone(),
            queued_at: Instant::now(),
        }));

        if let Err(e) = self
            .client
            .publish(&self.topic, self.qos, self.retain, payload.clone())
            .await
        {
            eprintln!(
                "Immediate publish error {} for event={} payload={}",
                e,
                event.as_str(),
                payload
            );
            // Nothing will reach the wire for this record; retract it so it
            // cannot pair with the next publish's packet id.
            let _ = self.pending.send(Submission::Withdrawn);
            return;
        }

        // tiny delay to let the event loop and network run
        time::sleep(PUBLISH_GRACE).await;
    }

    /// Orderly disconnect at quit; errors only mean we were never connected.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            eprintln!("disconnect error: {}", e);
        }
    }
}

/// Long-running event-loop driver. Intended to be spawned with
/// `tokio::task::spawn` from `app::run()` so it runs in the background; it
/// returns when `shutdown` fires. Connection failures and poll errors are
/// logged but never terminate the task: the interactive loop keeps going and
/// later publishes simply fail locally until the client reconnects.
pub async fn run_event_loop(
    mut eventloop: EventLoop,
    pending: Receiver<Submission>,
    shutdown: Arc<Notify>,
) {
    let mut queue: VecDeque<InflightRecord> = VecDeque::new();
    let mut inflight: HashMap<u16, InflightRecord> = HashMap::new();

    // Periodic stale-record sweep. Prime-numbered period to avoid alignment
    // with other periodic activity like the client keep-alive.
    let mut sweep = time::interval(Duration::from_secs(127));

    loop {
        tokio::select! {
            ev = eventloop.poll() => {
                match ev {
                    Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            println!("Connected to broker");
                        } else {
                            // Non-fatal: subsequent publishes fail locally
                            // until a later reconnect succeeds.
                            eprintln!("Connection failed with code {:?}", ack.code);
                        }
                    }
                    Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                        drain_pending(&pending, &mut queue);
                        pair_outgoing(pkid, &mut queue, &mut inflight);
                    }
                    Ok(Event::Incoming(Incoming::PubAck(ack))) => {
                        complete(&mut inflight, ack.pkid);
                    }
                    Ok(Event::Incoming(Incoming::PubComp(comp))) => {
                        complete(&mut inflight, comp.pkid);
                    }
                    // Keep-alives and QoS 2 intermediates are noise next to
                    // an interactive prompt; stay quiet.
                    Ok(_) => {}
                    Err(e) => {
                        // Back off on errors to avoid busy loops; the client
                        // reconnects on the next poll.
                        eprintln!("mqtt loop error: {}", e);
                        time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
            _ = sweep.tick() => {
                let dropped = sweep_stale(&mut inflight, Instant::now(), INFLIGHT_TTL);
                if dropped > 0 {
                    eprintln!("dropped {} unacknowledged publish record(s)", dropped);
                }
            }
            _ = shutdown.notified() => {
                break;
            }
        }
    }
}

/// Move foreground submissions into the local pairing queue. A `Withdrawn`
/// marker retracts the record queued right before it.
fn drain_pending(pending: &Receiver<Submission>, queue: &mut VecDeque<InflightRecord>) {
    while let Ok(submission) = pending.try_recv() {
        match submission {
            Submission::Queued(record) => queue.push_back(record),
            Submission::Withdrawn => {
                queue.pop_back();
            }
        }
    }
}

/// Attribute a wire-level publish to the oldest unpaired record. A pkid that
/// is already tracked is a retransmission of an unacked packet and must not
/// consume a fresh record; QoS 0 has no acknowledgement, so its record is
/// logged here and never enters the table.
fn pair_outgoing(
    pkid: u16,
    queue: &mut VecDeque<InflightRecord>,
    inflight: &mut HashMap<u16, InflightRecord>,
) {
    if pkid != 0 && inflight.contains_key(&pkid) {
        return;
    }
    let Some(record) = queue.pop_front() else {
        return;
    };
    if pkid == 0 {
        println!(
            "Published topic={} event={} payload={}",
            record.topic, record.event, record.payload
        );
    } else {
        inflight.insert(pkid, record);
    }
}

/// Log and discard the in-flight record for an acknowledged packet id. An
/// unknown id (record already swept) still gets a line with just the id.
fn complete(inflight: &mut HashMap<u16, InflightRecord>, pkid: u16) {
    match inflight.remove(&pkid) {
        Some(record) => println!(
            "Published pkid={} topic={} event={} payload={}",
            pkid, record.topic, record.event, record.payload
        ),
        None => println!("Published (pkid={})", pkid),
    }
}

/// Drop records whose acknowledgement is overdue; returns how many went.
fn sweep_stale(
    inflight: &mut HashMap<u16, InflightRecord>,
    now: Instant,
    ttl: Duration,
) -> usize {
    let before = inflight.len();
    inflight.retain(|_, record| now.duration_since(record.queued_at) < ttl);
    before - inflight.len()
}

//   TESTS
//
